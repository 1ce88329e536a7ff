use crate::models::{Registration, VoteSummary};

pub fn is_valid_vote(vote: i32) -> bool {
    (1..=5).contains(&vote)
}

/// Aggregates votes and reviews left on an event's registrations. Votes
/// outside 1..=5 are ignored.
pub fn summarize_votes(event_id: i64, registrations: &[Registration]) -> VoteSummary {
    let mut histogram = vec![0usize; 5];
    let mut total = 0i64;

    for vote in registrations
        .iter()
        .filter_map(|r| r.vote)
        .filter(|v| is_valid_vote(*v))
    {
        histogram[(vote - 1) as usize] += 1;
        total += i64::from(vote);
    }

    let votes: usize = histogram.iter().sum();
    let average = (votes > 0).then(|| (total as f64 / votes as f64 * 10.0).round() / 10.0);
    let reviews = registrations
        .iter()
        .flat_map(|r| r.reviews.iter())
        .map(|review| review.trim())
        .filter(|review| !review.is_empty())
        .map(str::to_string)
        .collect();

    VoteSummary {
        event_id,
        votes,
        average,
        histogram,
        reviews,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_summarize_votes() {
        let registrations: Vec<Registration> = serde_json::from_value(json!([
            {"id": 1, "event_id": 9, "vote": 5, "reviews": ["Great", "  "]},
            {"id": 2, "event_id": 9, "vote": 4, "reviews": null},
            {"id": 3, "event_id": 9, "vote": null, "reviews": ["Too short"]},
            {"id": 4, "event_id": 9, "vote": 4},
            {"id": 5, "event_id": 9, "vote": 9}
        ]))
        .unwrap();

        let summary = summarize_votes(9, &registrations);
        assert_eq!(summary.votes, 3);
        assert_eq!(summary.average, Some(4.3));
        assert_eq!(summary.histogram, vec![0, 0, 0, 2, 1]);
        assert_eq!(summary.reviews, vec!["Great", "Too short"]);
    }

    #[test]
    fn test_no_votes() {
        let summary = summarize_votes(1, &[]);
        assert_eq!(summary.votes, 0);
        assert!(summary.average.is_none());
        assert_eq!(summary.histogram, vec![0; 5]);
    }
}
