/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `task_options`: Conference selection change for the task widget
/// - `conferences`: Conference statistics
/// - `categories`: Category task sets and their propagation
/// - `tasks`: Task deletion
/// - `persons`: Per-person assignments and category moves

pub mod categories;
pub mod conferences;
pub mod health;
pub mod persons;
pub mod task_options;
pub mod tasks;
