//! Logging setup for meshchat binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber with the specified default log level.
///
/// Logs from the meshchat crates and from the binary itself are enabled at
/// `default_log_level`. The filter can be overridden with `RUST_LOG`.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "meshchat-client")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn")
///
/// # Examples
///
/// ```no_run
/// use meshchat_shared::logger::setup_logger;
///
/// setup_logger("meshchat-client", "info");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn default_filter(binary_name: &str, default_log_level: &str) -> String {
    format!(
        "meshchat_core={level},meshchat_client={level},{}={level}",
        binary_name.replace('-', "_"),
        level = default_log_level,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_covers_crates_and_binary() {
        // テスト項目: デフォルトのフィルタにコアクレートとバイナリが含まれる
        // given (前提条件):
        let binary_name = "meshchat-client";

        // when (操作):
        let filter = default_filter(binary_name, "debug");

        // then (期待する結果):
        assert!(filter.contains("meshchat_core=debug"));
        assert!(filter.contains("meshchat_client=debug"));
        assert!(filter.ends_with("meshchat_client=debug"));
    }
}
