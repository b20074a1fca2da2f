use std::fmt;
use std::path::PathBuf;

/// Where the reference CSV lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatasetSource {
    Path(PathBuf),
    Url(String),
}

impl From<&str> for DatasetSource {
    fn from(s: &str) -> Self {
        if s.starts_with("http://") || s.starts_with("https://") {
            DatasetSource::Url(s.to_string())
        } else {
            DatasetSource::Path(PathBuf::from(s))
        }
    }
}

impl fmt::Display for DatasetSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetSource::Path(path) => write!(f, "{}", path.display()),
            DatasetSource::Url(url) => f.write_str(url),
        }
    }
}
