//! Configuration access port trait.

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str, default: i64) -> i64;
    fn get_double(&self, section: &str, key: &str, default: f64) -> f64;
    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool;

    /// `None` when the key is absent, blank or not a number.
    fn get_optional_double(&self, section: &str, key: &str) -> Option<f64> {
        self.get_string(section, key)
            .and_then(|v| v.trim().parse::<f64>().ok())
    }

    /// `None` when the key is absent, blank or not a non-negative integer.
    fn get_optional_uint(&self, section: &str, key: &str) -> Option<u64> {
        self.get_string(section, key)
            .and_then(|v| v.trim().parse::<u64>().ok())
    }

    /// `None` when the key is absent or not a recognizable boolean.
    fn get_optional_bool(&self, section: &str, key: &str) -> Option<bool> {
        self.get_string(section, key)
            .and_then(|v| match v.trim().to_lowercase().as_str() {
                "true" | "yes" | "1" => Some(true),
                "false" | "no" | "0" => Some(false),
                _ => None,
            })
    }
}
