use std::fmt;

// Totals are displayed to one decimal; this absorbs representation error at the boundary.
const EDGE_EPS: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Recommendation {
    Over,
    Under,
    NoBet,
    Tbd,
}

impl Recommendation {
    pub fn as_str(self) -> &'static str {
        match self {
            Recommendation::Over => "OVER",
            Recommendation::Under => "UNDER",
            Recommendation::NoBet => "NO_BET",
            Recommendation::Tbd => "TBD",
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Over/under call for one game. `threshold` is the edge in runs the model
/// total must clear the book total by.
pub fn decide(model_total: Option<f64>, book_total: Option<f64>, threshold: f64) -> Recommendation {
    let (Some(model), Some(book)) = (model_total, book_total) else {
        return Recommendation::Tbd;
    };
    if !model.is_finite() || !book.is_finite() {
        return Recommendation::Tbd;
    }
    if model + EDGE_EPS >= book + threshold {
        Recommendation::Over
    } else if model - EDGE_EPS <= book - threshold {
        Recommendation::Under
    } else {
        Recommendation::NoBet
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inside_threshold_is_no_bet() {
        assert_eq!(decide(Some(8.5), Some(9.0), 2.0), Recommendation::NoBet);
    }

    #[test]
    fn clears_threshold_over() {
        assert_eq!(decide(Some(11.2), Some(9.0), 2.0), Recommendation::Over);
        assert_eq!(decide(Some(11.0), Some(9.0), 2.0), Recommendation::Over);
    }

    #[test]
    fn clears_threshold_under() {
        assert_eq!(decide(Some(6.1), Some(8.1), 2.0), Recommendation::Under);
        assert_eq!(decide(Some(6.2), Some(8.1), 2.0), Recommendation::NoBet);
    }

    #[test]
    fn missing_inputs_are_tbd() {
        assert_eq!(decide(None, Some(9.0), 2.0), Recommendation::Tbd);
        assert_eq!(decide(Some(9.0), None, 2.0), Recommendation::Tbd);
        assert_eq!(decide(Some(f64::NAN), Some(9.0), 2.0), Recommendation::Tbd);
    }

    #[test]
    fn zero_threshold_always_picks_a_side_unless_equal() {
        assert_eq!(decide(Some(9.1), Some(9.0), 0.0), Recommendation::Over);
        assert_eq!(decide(Some(8.9), Some(9.0), 0.0), Recommendation::Under);
        // Equal totals satisfy the over test first.
        assert_eq!(decide(Some(9.0), Some(9.0), 0.0), Recommendation::Over);
    }

    #[test]
    fn every_input_maps_to_exactly_one_call() {
        let totals = [None, Some(0.0), Some(6.5), Some(8.5), Some(9.0), Some(11.5), Some(14.0)];
        for model in totals {
            for book in totals {
                let rec = decide(model, book, 2.0);
                assert_eq!(rec == Recommendation::Tbd, model.is_none() || book.is_none());
            }
        }
    }
}
