use crate::config::FeedTuning;
use aduan_model::{EngagementCounts, ReportItem};
use std::cmp::Reverse;

/// Ranking score: comments weigh double.
pub fn engagement_score(counts: &EngagementCounts) -> u64 {
    counts.likes + 2 * counts.comments
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedReport {
    pub report: ReportItem,
    pub score: u64,
    /// 1-based badge position, only assigned to the leading entries of
    /// an unfiltered ranking.
    pub top_rank: Option<usize>,
}

/// Rank reports by engagement, descending, ties keeping input order.
///
/// Only the leading `trending_pool` candidates are scored; callers pass
/// items newest first, so the pool is the most recent slice. The
/// optional region needle narrows the output by address substring
/// (case-insensitive) after scoring and suppresses top-rank badges.
pub fn rank(reports: &[ReportItem], region: Option<&str>, tuning: &FeedTuning) -> Vec<RankedReport> {
    let pool = &reports[..reports.len().min(tuning.trending_pool)];

    let mut ranked: Vec<RankedReport> = pool
        .iter()
        .map(|report| RankedReport {
            score: engagement_score(&report.counts),
            report: report.clone(),
            top_rank: None,
        })
        .collect();
    // Stable sort: equal scores keep fetch order.
    ranked.sort_by_key(|r| Reverse(r.score));

    match normalized_region(region) {
        Some(needle) => {
            ranked.retain(|r| address_contains(&r.report, &needle));
        }
        None => {
            for (idx, entry) in ranked.iter_mut().take(tuning.top_ranked).enumerate() {
                entry.top_rank = Some(idx + 1);
            }
        }
    }

    log::debug!("ranked {} of {} candidates", ranked.len(), pool.len());
    ranked
}

fn normalized_region(region: Option<&str>) -> Option<String> {
    region
        .map(str::trim)
        .filter(|r| !r.is_empty() && !r.eq_ignore_ascii_case("all"))
        .map(str::to_lowercase)
}

fn address_contains(report: &ReportItem, needle: &str) -> bool {
    report
        .location
        .as_ref()
        .map(|loc| loc.address.to_lowercase().contains(needle))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aduan_model::{Location, ReportCategory, ReportStatus};
    use pretty_assertions::assert_eq;

    fn item(id: &str, likes: u64, comments: u64, address: Option<&str>) -> ReportItem {
        ReportItem {
            id: id.to_string(),
            title: format!("report {id}"),
            description: None,
            category: ReportCategory::Other,
            status: ReportStatus::Open,
            photo_url: None,
            location: address.map(|a| Location {
                address: a.to_string(),
                lat: None,
                lng: None,
            }),
            created_at_unix_ms: 0,
            creator_id: None,
            counts: EngagementCounts {
                likes,
                comments,
                confirmations: 0,
            },
            is_hidden: false,
            is_locked: false,
        }
    }

    #[test]
    fn score_weighs_comments_double() {
        assert_eq!(engagement_score(&EngagementCounts { likes: 2, comments: 1, confirmations: 0 }), 4);
        assert_eq!(engagement_score(&EngagementCounts { likes: 0, comments: 2, confirmations: 0 }), 4);
        assert_eq!(engagement_score(&EngagementCounts::default()), 0);
    }

    #[test]
    fn ties_preserve_fetch_order() {
        let reports = vec![item("a", 2, 1, None), item("b", 0, 2, None)];
        let ranked = rank(&reports, None, &FeedTuning::default());
        assert_eq!(ranked[0].report.id, "a");
        assert_eq!(ranked[1].report.id, "b");
        assert_eq!(ranked[0].score, 4);
        assert_eq!(ranked[1].score, 4);
    }

    #[test]
    fn highest_score_first_with_top_badges() {
        let reports = vec![
            item("low", 1, 0, None),
            item("high", 10, 5, None),
            item("mid", 3, 1, None),
            item("zero", 0, 0, None),
        ];
        let ranked = rank(&reports, None, &FeedTuning::default());
        let order: Vec<&str> = ranked.iter().map(|r| r.report.id.as_str()).collect();
        assert_eq!(order, vec!["high", "mid", "low", "zero"]);
        assert_eq!(ranked[0].top_rank, Some(1));
        assert_eq!(ranked[2].top_rank, Some(3));
        assert_eq!(ranked[3].top_rank, None);
    }

    #[test]
    fn region_filter_drops_badges_and_narrows() {
        let reports = vec![
            item("kl", 5, 0, Some("Jalan Ampang, Kuala Lumpur")),
            item("jb", 9, 0, Some("Jalan Wong Ah Fook, Johor")),
            item("none", 9, 9, None),
        ];
        let ranked = rank(&reports, Some("johor"), &FeedTuning::default());
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].report.id, "jb");
        assert_eq!(ranked[0].top_rank, None);

        // "all" means no region filter.
        let ranked = rank(&reports, Some("all"), &FeedTuning::default());
        assert_eq!(ranked.len(), 3);
        assert_eq!(ranked[0].top_rank, Some(1));
    }

    #[test]
    fn pool_is_bounded_before_scoring() {
        let tuning = FeedTuning {
            trending_pool: 2,
            ..FeedTuning::default()
        };
        // The third item has the best score but sits outside the pool.
        let reports = vec![item("a", 1, 0, None), item("b", 2, 0, None), item("c", 99, 0, None)];
        let ranked = rank(&reports, None, &tuning);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].report.id, "b");
    }
}
