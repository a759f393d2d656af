use ahash::HashMap;
use polars::prelude::*;
use tracing::debug;

use crate::aggregate::{Ranked, rank_descending, ratio};
use crate::config::ColumnNames;
use crate::data::{numeric_column, text_column};
use crate::error::Result;

/// Vote-weighted rating of one category.
#[derive(Clone, Debug, PartialEq)]
pub struct CategoryRating {
    pub label: String,
    /// `Σ(vote_count · vote_average) / Σ vote_count` over the category.
    pub weighted_rating: f64,
    /// Plain mean of `vote_average`, each title counting once.
    pub unweighted_mean: f64,
    pub vote_total: f64,
    /// Category votes as a percentage of all votes. A high rating backed by a
    /// tiny share is not a reliable signal.
    pub vote_share_percent: f64,
    pub titles: usize,
}

impl Ranked for CategoryRating {
    fn label(&self) -> &str {
        &self.label
    }
    fn score(&self) -> f64 {
        self.weighted_rating
    }
}

#[derive(Default)]
struct Votes {
    /// Every vote cast in the category, rated or not.
    count: f64,
    /// Votes of titles that also carry an average.
    rated_count: f64,
    product: f64,
    rating_sum: f64,
    titles: usize,
}

/// Weighted ratings per value of `category`, best first.
///
/// Rows with a missing category or vote count are skipped. A row with votes but
/// no average still counts toward `vote_total` and the share denominator, but
/// not toward the ratings. Categories whose rating or share is undefined (no
/// rated votes) are left out of the result.
pub fn weighted_ratings(
    df: &DataFrame,
    category: &str,
    columns: &ColumnNames,
) -> Result<Vec<CategoryRating>> {
    let labels = text_column(df, category)?;
    let counts = numeric_column(df, &columns.vote_count)?;
    let averages = numeric_column(df, &columns.vote_average)?;

    let mut groups: HashMap<&str, Votes> = HashMap::default();
    for ((label, count), average) in labels.iter().zip(&counts).zip(&averages) {
        let (Some(label), Some(count)) = (label.as_deref(), *count) else {
            continue;
        };
        let votes = groups.entry(label).or_default();
        votes.count += count;
        if let Some(average) = *average {
            votes.rated_count += count;
            votes.product += count * average;
            votes.rating_sum += average;
            votes.titles += 1;
        }
    }

    let all_votes: f64 = groups.values().map(|votes| votes.count).sum();

    let mut ratings = Vec::with_capacity(groups.len());
    for (label, votes) in groups {
        let rated = ratio(label, votes.product, votes.rated_count)
            .and_then(|rating| Ok((rating, ratio(label, votes.count, all_votes)?)));
        let (weighted_rating, share) = match rated {
            Ok(pair) => pair,
            Err(err) => {
                debug!(%err, "omitting category from weighted ratings");
                continue;
            }
        };
        ratings.push(CategoryRating {
            label: label.to_string(),
            weighted_rating,
            unweighted_mean: votes.rating_sum / votes.titles as f64,
            vote_total: votes.count,
            vote_share_percent: share * 100.0,
            titles: votes.titles,
        });
    }

    rank_descending(&mut ratings);
    Ok(ratings)
}

#[cfg(test)]
mod test_rating {
    use super::*;

    fn find<'a>(ratings: &'a [CategoryRating], label: &str) -> &'a CategoryRating {
        ratings
            .iter()
            .find(|r| r.label == label)
            .expect("category present")
    }

    #[test]
    fn test_weighted_not_mean_of_means() -> Result<()> {
        let df = df!(
            "genres" => ["Drama", "Drama"],
            "vote_count" => [10i64, 90],
            "vote_average" => [2.0, 8.0],
        )?;
        let ratings = weighted_ratings(&df, "genres", &ColumnNames::default())?;
        assert_eq!(ratings.len(), 1);

        let drama = &ratings[0];
        assert!((drama.weighted_rating - 7.4).abs() < 1e-9);
        assert!((drama.unweighted_mean - 5.0).abs() < 1e-9);
        assert_eq!(drama.vote_total, 100.0);
        assert_eq!(drama.vote_share_percent, 100.0);
        assert_eq!(drama.titles, 2);
        Ok(())
    }

    #[test]
    fn test_vote_share_and_order() -> Result<()> {
        let df = df!(
            "genres" => [Some("Documentary"), Some("Action"), Some("Action"), Some("Drama"), None],
            "vote_count" => [Some(10i64), Some(600), Some(200), Some(190), Some(1000)],
            "vote_average" => [Some(7.5), Some(6.0), Some(7.0), Some(6.9), Some(9.9)],
        )?;
        let ratings = weighted_ratings(&df, "genres", &ColumnNames::default())?;
        let order: Vec<&str> = ratings.iter().map(|r| r.label.as_str()).collect();
        assert_eq!(order, vec!["Documentary", "Drama", "Action"]);

        // The unlabeled row's votes do not count toward the total.
        let documentary = find(&ratings, "Documentary");
        assert!((documentary.vote_share_percent - 1.0).abs() < 1e-9);
        let action = find(&ratings, "Action");
        assert!((action.weighted_rating - 6.25).abs() < 1e-9);
        assert!((action.vote_share_percent - 80.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_unrated_votes_count_toward_share() -> Result<()> {
        let df = df!(
            "genres" => ["Horror", "Horror", "Comedy"],
            "vote_count" => [Some(30i64), Some(50), Some(20)],
            "vote_average" => [Some(6.0), None, Some(7.0)],
        )?;
        let ratings = weighted_ratings(&df, "genres", &ColumnNames::default())?;

        let horror = find(&ratings, "Horror");
        assert_eq!(horror.weighted_rating, 6.0);
        assert_eq!(horror.vote_total, 80.0);
        assert!((horror.vote_share_percent - 80.0).abs() < 1e-9);
        assert_eq!(horror.titles, 1);
        let comedy = find(&ratings, "Comedy");
        assert!((comedy.vote_share_percent - 20.0).abs() < 1e-9);
        Ok(())
    }

    #[test]
    fn test_zero_votes_are_undefined() -> Result<()> {
        let df = df!(
            "genres" => ["Foreign", "Drama"],
            "vote_count" => [0i64, 50],
            "vote_average" => [0.0, 6.5],
        )?;
        let ratings = weighted_ratings(&df, "genres", &ColumnNames::default())?;
        assert_eq!(ratings.len(), 1);
        assert_eq!(ratings[0].label, "Drama");
        assert!(ratings.iter().all(|r| r.weighted_rating.is_finite()));
        Ok(())
    }
}
