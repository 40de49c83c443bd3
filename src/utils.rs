//! # Utility Functions Module
//!
//! Small helpers shared by the workers: argument-vector building for the
//! external tools, printable command lines for the error log and the
//! elapsed-time format used by the final summary.

use std::path::Path;
use std::time::Duration;

/// Converts any iterable of displayable items into owned argument strings.
///
/// # Example
/// ```rust
/// use asset_baker::utils::to_string_vec;
///
/// let level = 10;
/// let args = to_string_vec(["deflate", "--zstd", &level.to_string()]);
/// assert_eq!(args, vec!["deflate", "--zstd", "10"]);
/// ```
pub fn to_string_vec<T, I>(items: I) -> Vec<String>
where
    T: ToString,
    I: IntoIterator<Item = T>,
{
    items.into_iter().map(|item| item.to_string()).collect()
}

/// Builds an argument vector from heterogeneous displayable items.
///
/// # Example
/// ```rust
/// use asset_baker::args;
///
/// let quality = 0.5;
/// let args = args!["-Quality", quality, "-EncodeWith", "GPU"];
/// assert_eq!(args, vec!["-Quality", "0.5", "-EncodeWith", "GPU"]);
/// ```
#[macro_export]
macro_rules! args {
    [$($item:expr),* $(,)?] => {
        $crate::utils::to_string_vec([$($item.to_string()),*])
    };
}

/// Space-joined command line, as written to the error log
pub fn format_command(program: &Path, args: &[String]) -> String {
    let mut parts = Vec::with_capacity(args.len() + 1);
    parts.push(program.display().to_string());
    parts.extend(args.iter().cloned());
    parts.join(" ")
}

/// Formats a duration as `<minutes>m:<seconds>s:<millis>ms`
pub fn format_elapsed(elapsed: Duration) -> String {
    let total_secs = elapsed.as_secs();
    format!(
        "{}m:{}s:{}ms",
        total_secs / 60,
        total_secs % 60,
        elapsed.subsec_millis()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_to_string_vec_mixed_types() {
        let level = 19;
        let result = to_string_vec(["--zstd", &level.to_string()]);
        assert_eq!(result, vec!["--zstd".to_string(), "19".to_string()]);
    }

    #[test]
    fn test_to_string_vec_empty() {
        let result: Vec<String> = to_string_vec(Vec::<&str>::new());
        assert!(result.is_empty());
    }

    #[test]
    fn test_args_macro() {
        let threads = 16;
        let result = args!["-NumThreads", threads];
        assert_eq!(result, vec!["-NumThreads".to_string(), "16".to_string()]);
    }

    #[test]
    fn test_format_command() {
        let program = PathBuf::from("/tools/ktx");
        let args = args!["deflate", "--zstd", 10, "a.ktx2", "a.ktx2"];
        assert_eq!(format_command(&program, &args), "/tools/ktx deflate --zstd 10 a.ktx2 a.ktx2");
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "0m:0s:0ms");
        assert_eq!(format_elapsed(Duration::from_millis(125_042)), "2m:5s:42ms");
    }
}
