use serde::{Deserialize, Serialize};

use crate::domain::ProjectId;

pub const API_PREFIX: &str = "/api/v2";
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination query accepted by every list endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub per_page: u32,
}

impl PageQuery {
    pub fn first() -> Self {
        Self {
            page: 1,
            per_page: MAX_PER_PAGE,
        }
    }

    pub fn next(self) -> Self {
        Self {
            page: self.page + 1,
            ..self
        }
    }
}

impl Default for PageQuery {
    fn default() -> Self {
        Self::first()
    }
}

const API_SEGMENTS: [&str; 2] = ["api", "v2"];

/// Unescaped path segments below the API base. Callers must escape each
/// segment on its own, since ids come from the remote side.
pub fn projects_segments() -> Vec<String> {
    API_SEGMENTS
        .iter()
        .map(|segment| segment.to_string())
        .chain(["projects".to_string()])
        .collect()
}

pub fn locales_segments(project_id: &ProjectId) -> Vec<String> {
    let mut segments = projects_segments();
    segments.push(project_id.to_string());
    segments.push("locales".to_string());
    segments
}

pub fn authorization_header(token: &str) -> String {
    format!("token {token}")
}
