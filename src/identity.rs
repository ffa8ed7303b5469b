use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

struct Franchise {
    code: &'static str,
    aliases: &'static [&'static str],
}

const FRANCHISES: &[Franchise] = &[
    Franchise {
        code: "ARI",
        aliases: &["Arizona Diamondbacks", "Arizona", "Diamondbacks", "D-backs", "AZ", "ARZ"],
    },
    Franchise {
        code: "ATH",
        aliases: &[
            "Athletics",
            "Oakland Athletics",
            "Oakland",
            "Sacramento",
            "Sacramento Athletics",
            "A's",
            "OAK",
        ],
    },
    Franchise {
        code: "ATL",
        aliases: &["Atlanta Braves", "Atlanta", "Braves"],
    },
    Franchise {
        code: "BAL",
        aliases: &["Baltimore Orioles", "Baltimore", "Orioles"],
    },
    Franchise {
        code: "BOS",
        aliases: &["Boston Red Sox", "Boston", "Red Sox"],
    },
    Franchise {
        code: "CHC",
        aliases: &["Chicago Cubs", "Chi Cubs", "Cubs", "CHN"],
    },
    Franchise {
        code: "CWS",
        aliases: &[
            "Chicago White Sox",
            "Chi White Sox",
            "Chi Sox",
            "White Sox",
            "CHW",
            "CHA",
        ],
    },
    Franchise {
        code: "CIN",
        aliases: &["Cincinnati Reds", "Cincinnati", "Reds"],
    },
    Franchise {
        code: "CLE",
        aliases: &["Cleveland Guardians", "Cleveland", "Guardians"],
    },
    Franchise {
        code: "COL",
        aliases: &["Colorado Rockies", "Colorado", "Rockies"],
    },
    Franchise {
        code: "DET",
        aliases: &["Detroit Tigers", "Detroit", "Tigers"],
    },
    Franchise {
        code: "HOU",
        aliases: &["Houston Astros", "Houston", "Astros"],
    },
    Franchise {
        code: "KC",
        aliases: &["Kansas City Royals", "Kansas City", "Royals", "KCR", "KCA"],
    },
    Franchise {
        code: "LAA",
        aliases: &[
            "Los Angeles Angels",
            "LA Angels",
            "Los Angeles Angels of Anaheim",
            "Anaheim Angels",
            "Angels",
            "ANA",
        ],
    },
    Franchise {
        code: "LAD",
        aliases: &["Los Angeles Dodgers", "LA Dodgers", "Dodgers", "LAN"],
    },
    Franchise {
        code: "MIA",
        aliases: &["Miami Marlins", "Miami", "Marlins", "FLA"],
    },
    Franchise {
        code: "MIL",
        aliases: &["Milwaukee Brewers", "Milwaukee", "Brewers"],
    },
    Franchise {
        code: "MIN",
        aliases: &["Minnesota Twins", "Minnesota", "Twins"],
    },
    Franchise {
        code: "NYM",
        aliases: &["New York Mets", "NY Mets", "Mets", "NYN"],
    },
    Franchise {
        code: "NYY",
        aliases: &["New York Yankees", "NY Yankees", "Yankees", "NYA"],
    },
    Franchise {
        code: "PHI",
        aliases: &["Philadelphia Phillies", "Philadelphia", "Phillies"],
    },
    Franchise {
        code: "PIT",
        aliases: &["Pittsburgh Pirates", "Pittsburgh", "Pirates"],
    },
    Franchise {
        code: "SD",
        aliases: &["San Diego Padres", "San Diego", "Padres", "SDP", "SDN"],
    },
    Franchise {
        code: "SEA",
        aliases: &["Seattle Mariners", "Seattle", "Mariners"],
    },
    Franchise {
        code: "SF",
        aliases: &["San Francisco Giants", "San Francisco", "SF Giants", "Giants", "SFG", "SFN"],
    },
    Franchise {
        code: "STL",
        aliases: &["St. Louis Cardinals", "St Louis Cardinals", "St. Louis", "St Louis", "Cardinals", "SLN"],
    },
    Franchise {
        code: "TB",
        aliases: &["Tampa Bay Rays", "Tampa Bay", "Rays", "TBR", "TBA"],
    },
    Franchise {
        code: "TEX",
        aliases: &["Texas Rangers", "Texas", "Rangers"],
    },
    Franchise {
        code: "TOR",
        aliases: &["Toronto Blue Jays", "Toronto", "Blue Jays"],
    },
    Franchise {
        code: "WSH",
        aliases: &["Washington Nationals", "Washington", "Nationals", "WSN", "WAS"],
    },
];

static ALIASES: Lazy<HashMap<String, &'static str>> = Lazy::new(|| {
    let mut map = HashMap::new();
    for franchise in FRANCHISES {
        map.insert(fold(franchise.code), franchise.code);
        for alias in franchise.aliases {
            map.insert(fold(alias), franchise.code);
        }
    }
    map
});

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TeamKey(String);

impl TeamKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_canonical(&self) -> bool {
        FRANCHISES.iter().any(|f| f.code == self.0)
    }
}

impl fmt::Display for TeamKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn normalize_team(raw: &str) -> TeamKey {
    match ALIASES.get(&fold(raw)) {
        Some(code) => TeamKey((*code).to_string()),
        None => TeamKey(raw.trim().to_string()),
    }
}

pub fn canonical_codes() -> impl Iterator<Item = &'static str> {
    FRANCHISES.iter().map(|f| f.code)
}

/// Join key for probable-pitcher names: case, punctuation and spacing folded.
pub fn pitcher_key(name: &str) -> String {
    fold(name)
}

fn fold(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter_map(|c| {
            if c.is_alphanumeric() {
                Some(c.to_lowercase().next().unwrap_or(c))
            } else if c.is_whitespace() || c == '-' {
                Some(' ')
            } else {
                None
            }
        })
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}
