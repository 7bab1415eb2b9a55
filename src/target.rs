use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};

/// Where an outline entry points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Page(u32),
    Range { start: u32, end: u32 },
    /// The destination could not be mapped to a page of this document.
    Unresolved,
}

impl Target {
    /// Parse a target like "5" or "5-10"
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Err(anyhow!("Empty page"));
        }

        if let Some(dash_pos) = s.find('-') {
            // "-5" is a negative number, not a range
            if dash_pos == 0 {
                return Err(anyhow!("Invalid page range: {}", s));
            }

            let start = parse_page(&s[..dash_pos])?;
            let end = parse_page(&s[dash_pos + 1..])?;
            if end < start {
                return Err(anyhow!("Page range {} ends before it starts", s));
            }

            Ok(Target::Range { start, end })
        } else {
            Ok(Target::Page(parse_page(s)?))
        }
    }

    /// The page a PDF destination should point at. Ranges collapse to their start.
    pub fn start_page(&self) -> Option<u32> {
        match *self {
            Target::Page(p) => Some(p),
            Target::Range { start, .. } => Some(start),
            Target::Unresolved => None,
        }
    }

    pub fn is_range(&self) -> bool {
        matches!(self, Target::Range { .. })
    }
}

impl Default for Target {
    fn default() -> Self {
        Target::Page(1)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Page(p) => write!(f, "{}", p),
            Target::Range { start, end } => write!(f, "{}-{}", start, end),
            Target::Unresolved => f.write_str("-"),
        }
    }
}

impl FromStr for Target {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        Target::parse(s)
    }
}

fn parse_page(s: &str) -> Result<u32> {
    let s = s.trim();
    let page = s
        .parse::<u32>()
        .map_err(|_| anyhow!("Invalid page number: {}", s))?;
    if page == 0 {
        return Err(anyhow!("Page numbers must be >= 1"));
    }
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_page() {
        assert_eq!(Target::parse("5").unwrap(), Target::Page(5));
        assert_eq!(Target::parse(" 12 ").unwrap(), Target::Page(12));
    }

    #[test]
    fn test_page_range() {
        let target = Target::parse("5-10").unwrap();
        assert_eq!(target, Target::Range { start: 5, end: 10 });
        assert_eq!(target.start_page(), Some(5));
        assert_eq!(target.to_string(), "5-10");
    }

    #[test]
    fn test_range_with_spaces() {
        assert_eq!(
            Target::parse("3 - 4").unwrap(),
            Target::Range { start: 3, end: 4 }
        );
    }

    #[test]
    fn test_single_page_range() {
        assert_eq!(
            Target::parse("7-7").unwrap(),
            Target::Range { start: 7, end: 7 }
        );
    }

    #[test]
    fn test_reverse_range_rejected() {
        assert!(Target::parse("10-5").is_err());
    }

    #[test]
    fn test_invalid_page_zero() {
        assert!(Target::parse("0").is_err());
        assert!(Target::parse("0-3").is_err());
    }

    #[test]
    fn test_malformed() {
        assert!(Target::parse("").is_err());
        assert!(Target::parse("abc").is_err());
        assert!(Target::parse("5-").is_err());
        assert!(Target::parse("-3").is_err());
        assert!(Target::parse("1-2-3").is_err());
    }

    #[test]
    fn test_unresolved_has_no_page() {
        assert_eq!(Target::Unresolved.start_page(), None);
    }
}
