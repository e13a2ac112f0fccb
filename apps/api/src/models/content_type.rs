use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ContentTypeRow {
    pub id: Uuid,
    pub name: String,
    pub extensions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A reference content type known at compile time. Mirrors the rows seeded by
/// the initial migration.
#[derive(Debug, Clone, Copy)]
pub struct KnownContentType {
    pub id: Uuid,
    pub name: &'static str,
    pub extensions: &'static [&'static str],
}

pub const PDF: KnownContentType = KnownContentType {
    id: Uuid::from_u128(0xc0a80101_0000_0000_0000_000000000001),
    name: "PDF",
    extensions: &["pdf"],
};

pub const DOCX: KnownContentType = KnownContentType {
    id: Uuid::from_u128(0xc0a80101_0000_0000_0000_000000000002),
    name: "DOCX",
    extensions: &["docx", "doc"],
};

pub const TXT: KnownContentType = KnownContentType {
    id: Uuid::from_u128(0xc0a80101_0000_0000_0000_000000000003),
    name: "TXT",
    extensions: &["txt", "md"],
};

pub const PPTX: KnownContentType = KnownContentType {
    id: Uuid::from_u128(0xc0a80101_0000_0000_0000_000000000011),
    name: "PPTX",
    extensions: &["pptx", "ppt"],
};

/// The content types exposed by `GET /api/content-types`, in listing order.
pub const LISTED: [KnownContentType; 4] = [PDF, DOCX, TXT, PPTX];

pub fn listed_ids() -> Vec<Uuid> {
    LISTED.iter().map(|ct| ct.id).collect()
}

/// Lowercased extension of a file name, if it has one.
pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Infers a listed content type from a file name's extension.
pub fn infer_from_file_name(file_name: &str) -> Option<KnownContentType> {
    let ext = extension_of(file_name)?;
    LISTED
        .iter()
        .find(|ct| ct.extensions.contains(&ext.as_str()))
        .copied()
}
