use aduan_backend::MemoryBackend;
use aduan_model::{
    EngagementCounts, Location, Profile, ReportCategory, ReportItem, ReportStatus, Role,
};
use std::sync::Arc;

/// Seed data for the demo backend. Timestamps count up so the feed
/// orders newest first; a couple of entries carry engagement so the
/// trending ranking has something to chew on.
const SEED: &[(&str, ReportCategory, ReportStatus, &str, u64, u64)] = &[
    ("Pothole near the school gate", ReportCategory::Roads, ReportStatus::Open, "Jalan Ampang, Kuala Lumpur", 12, 4),
    ("Street lamp out for a week", ReportCategory::Lighting, ReportStatus::Acknowledged, "Jalan Tun Razak, Kuala Lumpur", 7, 2),
    ("Overflowing bins at the market", ReportCategory::Waste, ReportStatus::Open, "Jalan Wong Ah Fook, Johor Bahru", 9, 6),
    ("Broken railing on the footbridge", ReportCategory::Safety, ReportStatus::InProgress, "Jalan Ipoh, Kuala Lumpur", 15, 3),
    ("Fallen tree blocking one lane", ReportCategory::Roads, ReportStatus::Open, "Persiaran Perdana, Putrajaya", 4, 1),
    ("Flickering lights in the underpass", ReportCategory::Lighting, ReportStatus::Open, "Jalan Duta, Kuala Lumpur", 2, 0),
    ("Illegal dumping behind the shops", ReportCategory::Waste, ReportStatus::Open, "Jalan Dhoby, Johor Bahru", 11, 8),
    ("Deep crack across the junction", ReportCategory::Roads, ReportStatus::Acknowledged, "Jalan Gasing, Petaling Jaya", 6, 2),
    ("Missing manhole cover", ReportCategory::Safety, ReportStatus::Open, "Jalan 222, Petaling Jaya", 20, 10),
    ("Graffiti on the community hall", ReportCategory::Other, ReportStatus::Closed, "Jalan Kebun, Shah Alam", 1, 0),
    ("Blocked storm drain floods the road", ReportCategory::Roads, ReportStatus::Open, "Jalan Meru, Klang", 8, 5),
    ("Playground swing chain snapped", ReportCategory::Safety, ReportStatus::Open, "Taman Tasik, Shah Alam", 5, 2),
];

pub(crate) fn backend() -> Arc<MemoryBackend> {
    let backend = Arc::new(MemoryBackend::new());

    backend.upsert_profile(Profile::named("demo-user", "Aisyah"));
    backend.upsert_profile(Profile {
        role: Role::Admin,
        ..Profile::named("admin", "Moderator")
    });

    let base = backend.now_ms();
    for (i, (title, category, status, address, likes, comments)) in SEED.iter().enumerate() {
        backend.insert_report(ReportItem {
            id: format!("seed-{}", i + 1),
            title: (*title).to_string(),
            description: None,
            category: *category,
            status: *status,
            photo_url: None,
            location: Some(Location {
                address: (*address).to_string(),
                lat: None,
                lng: None,
            }),
            created_at_unix_ms: base + i as u64 * 60_000,
            creator_id: Some("demo-user".to_string()),
            counts: EngagementCounts {
                likes: *likes,
                comments: *comments,
                confirmations: 0,
            },
            is_hidden: false,
            is_locked: false,
        });
    }
    backend
}
