/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `users`: User creation and listing
/// - `tasks`: Task CRUD with assignment handling
/// - `statistics`: Completed-task statistics

pub mod health;
pub mod statistics;
pub mod tasks;
pub mod users;
