//! Snapshot data model
//!
//! A `Snapshot` is the full exportable state for one user: the owner
//! identity, the task list, and the tag palette. It is the unit the sync
//! codec transports; the codec serializes it wholesale and never inspects
//! task or tag contents beyond that.

use serde::{Deserialize, Serialize};

/// A single tracked task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier (UUID v4 assigned on creation)
    pub id: String,

    /// Calendar date in ISO `YYYY-MM-DD` form
    pub date: String,

    /// Start time in `HH:MM` form
    pub start_time: String,

    /// End time in `HH:MM` form
    pub end_time: String,

    /// Free-text description
    pub description: String,

    /// Tag name referencing the accompanying tag palette
    pub tag: String,

    /// Optional embedded image payload (data URI)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// A named display color in the tag palette
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDefinition {
    /// Tag name (unique within a palette)
    pub name: String,

    /// Display color (opaque string, e.g. "#0ea5e9")
    pub color: String,
}

/// The full exportable dataset for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Identity the data belongs to
    pub owner: String,

    /// Tasks in insertion order (display layers re-sort by start time)
    pub tasks: Vec<Task>,

    /// Tag palette, names unique within the sequence
    pub tags: Vec<TagDefinition>,
}

impl Snapshot {
    /// Assemble a snapshot from the caller's current state
    pub fn new(owner: impl Into<String>, tasks: Vec<Task>, tags: Vec<TagDefinition>) -> Self {
        Self {
            owner: owner.into(),
            tasks,
            tags,
        }
    }
}
