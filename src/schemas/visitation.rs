use serde::{Deserialize, Serialize};
use time::Date;
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::VisitationNote;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct VisitationCreate {
    #[serde(alias = "visitedOn")]
    pub(crate) visited_on: Date,
    #[validate(length(min = 1, max = 4000))]
    pub(crate) note: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VisitationResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) visited_on: Date,
    pub(crate) note: String,
    pub(crate) visited_by: String,
    pub(crate) created_at: String,
}

impl VisitationResponse {
    pub(crate) fn from_db(note: VisitationNote) -> Self {
        Self {
            id: note.id,
            student_id: note.student_id,
            visited_on: note.visited_on,
            note: note.note,
            visited_by: note.visited_by,
            created_at: format_primitive(note.created_at),
        }
    }
}
