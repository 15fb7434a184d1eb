// Admin panel endpoints (`/api/admin/...`)
//
// Split by panel: users, audit log management, analytics, configuration.
// Most require the `admin` role and answer HTTP 403 otherwise.

mod analytics;
mod audit;
mod settings;
mod users;
