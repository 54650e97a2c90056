use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Client-side routing: entry points plus the route hierarchy the guard uses
/// to decide whether a destination needs authentication.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct RoutesConfig {
    pub login_path: String,
    pub register_path: String,
    /// Where an already-authenticated user lands instead of login/register.
    pub landing_path: String,
    /// Where unknown paths resolve to.
    pub fallback_path: String,
    pub table: Vec<RouteDef>,
}

/// One node of the route tree. Child paths are relative to their parent.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema, PartialEq, Eq)]
pub struct RouteDef {
    pub path: String,
    pub name: String,
    #[serde(default)]
    pub requires_auth: bool,
    #[serde(default)]
    pub children: Vec<RouteDef>,
}

impl RouteDef {
    pub fn new(path: &str, name: &str) -> Self {
        Self {
            path: path.to_string(),
            name: name.to_string(),
            requires_auth: false,
            children: Vec::new(),
        }
    }

    pub fn protected(mut self) -> Self {
        self.requires_auth = true;
        self
    }

    pub fn with_children(mut self, children: Vec<RouteDef>) -> Self {
        self.children = children;
        self
    }
}

impl Default for RoutesConfig {
    fn default() -> Self {
        let reports = ["summary", "daily", "category", "ranking", "ledger"]
            .into_iter()
            .map(|p| RouteDef::new(p, p))
            .collect();
        let settings = ["personality", "account"]
            .into_iter()
            .map(|p| RouteDef::new(p, p))
            .collect();

        Self {
            login_path: "/login".to_string(),
            register_path: "/register".to_string(),
            landing_path: "/chat".to_string(),
            fallback_path: "/".to_string(),
            table: vec![
                RouteDef::new("/", "layout")
                    .protected()
                    .with_children(vec![
                        RouteDef::new("chat", "chat"),
                        RouteDef::new("manual", "manual"),
                        RouteDef::new("reports", "reports").with_children(reports),
                        RouteDef::new("spending-habits", "spending-habits"),
                        RouteDef::new("settings", "settings").with_children(settings),
                    ]),
                RouteDef::new("/login", "login"),
                RouteDef::new("/register", "register"),
            ],
        }
    }
}
