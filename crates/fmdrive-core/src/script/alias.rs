//! Alias table - script keywords that stand for every enumerated unit.

/// The enumerated GM and test names, resolved once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasTable {
    gms: Vec<String>,
    tests: Vec<String>,
}

impl AliasTable {
    pub fn new(gms: Vec<String>, tests: Vec<String>) -> Self {
        Self { gms, tests }
    }

    pub fn gms(&self) -> &[String] {
        &self.gms
    }

    pub fn tests(&self) -> &[String] {
        &self.tests
    }

    /// Expansion for an alias keyword, or `None` for any other token.
    pub fn expand(&self, token: &str) -> Option<&[String]> {
        match token {
            "gm" | "gms" => Some(&self.gms),
            "test" | "tests" => Some(&self.tests),
            _ => None,
        }
    }
}
