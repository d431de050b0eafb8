/// Trait for spiders, as seen by the reporting extension.
///
/// Only the identity is needed here; parsing and scheduling stay with the
/// crawler.
pub trait Spider: Send + Sync + 'static {
    /// Get the name of the spider
    fn name(&self) -> &str;
}

/// A named spider with no behavior of its own
pub struct BasicSpider {
    name: String,
}

impl BasicSpider {
    /// Create a new basic spider
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self { name: name.into() }
    }
}

impl Spider for BasicSpider {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_spider_name() {
        let spider = BasicSpider::new("quotes");
        assert_eq!(spider.name(), "quotes");
    }
}
