use std::time::Duration;

pub const STATS_URL: &str = "http://localhost:3000/stats";

pub const DEFAULT_URL_1: &str = "http://192.168.1.157:8070";
pub const DEFAULT_URL_2: &str = "http://192.168.1.157:8075";

pub const DATABASE: &str = "timeit";
pub const COLLECTION: &str = "measurements";

pub const MAX_ATTEMPTS: u32 = 1;

/// A Lighthouse run on a slow page takes tens of seconds.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(5);

/// Everything the dashboard can be tuned with. Built once in `App` and shared
/// through the Leptos context.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub stats_url: String,
    pub default_urls: [String; 2],
    pub database: String,
    pub collection: String,
    /// Attempts per measurement, the first one included. Only network failures are retried.
    pub max_attempts: u32,
    /// Per attempt.
    pub request_timeout: Duration,
    pub success_display: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stats_url: STATS_URL.to_string(),
            default_urls: [DEFAULT_URL_1.to_string(), DEFAULT_URL_2.to_string()],
            database: DATABASE.to_string(),
            collection: COLLECTION.to_string(),
            max_attempts: MAX_ATTEMPTS,
            request_timeout: REQUEST_TIMEOUT,
            success_display: SUCCESS_DISPLAY,
        }
    }
}

impl Settings {
    /// Name of the document collection, `database.collection` like a Mongo namespace.
    pub fn namespace(&self) -> String {
        format!("{}.{}", self.database, self.collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();

        assert_eq!(settings.stats_url, "http://localhost:3000/stats");
        assert_eq!(settings.max_attempts, 1);
        assert_eq!(settings.request_timeout, Duration::from_secs(120));
        assert_eq!(settings.success_display, Duration::from_secs(5));
        assert_eq!(settings.namespace(), "timeit.measurements");
    }
}
