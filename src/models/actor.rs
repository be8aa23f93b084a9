use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActorRole {
    Applicant,
    #[serde(rename = "Bot Mimic")]
    BotMimic,
    Admin,
    System,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Applicant => "Applicant",
            ActorRole::BotMimic => "Bot Mimic",
            ActorRole::Admin => "Admin",
            ActorRole::System => "System",
        }
    }

    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase().replace(['_', '-'], " ");
        match normalized.as_str() {
            "applicant" => ActorRole::Applicant,
            "bot mimic" | "bot" => ActorRole::BotMimic,
            "admin" | "hr" => ActorRole::Admin,
            _ => ActorRole::System,
        }
    }
}

impl std::fmt::Display for ActorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved caller identity. Authentication itself lives outside this
/// service; handlers only ever see this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    pub id: Option<Uuid>,
    pub name: String,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: Option<Uuid>, name: impl Into<String>, role: ActorRole) -> Self {
        Self {
            id,
            name: name.into(),
            role,
        }
    }

    pub fn system() -> Self {
        Self::new(None, "System", ActorRole::System)
    }

    /// Unattended attribution used by the scheduled sweep.
    pub fn bot_unattended() -> Self {
        Self::new(None, "Auto Bot Mimic", ActorRole::BotMimic)
    }

    pub fn applicant(id: Uuid, name: impl Into<String>) -> Self {
        Self::new(Some(id), name, ActorRole::Applicant)
    }

    pub fn from_claims(claims: &crate::middleware::auth::Claims) -> Self {
        let id = Uuid::parse_str(&claims.sub).ok();
        let role = claims
            .role
            .as_deref()
            .map(ActorRole::parse)
            .unwrap_or(ActorRole::System);
        let name = claims
            .name
            .clone()
            .unwrap_or_else(|| claims.sub.clone());
        Self::new(id, name, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_accepts_common_spellings() {
        assert_eq!(ActorRole::parse("admin"), ActorRole::Admin);
        assert_eq!(ActorRole::parse("Bot Mimic"), ActorRole::BotMimic);
        assert_eq!(ActorRole::parse("bot_mimic"), ActorRole::BotMimic);
        assert_eq!(ActorRole::parse("applicant"), ActorRole::Applicant);
        assert_eq!(ActorRole::parse("something-else"), ActorRole::System);
    }

    #[test]
    fn bot_attribution_is_unattended() {
        let actor = Actor::bot_unattended();
        assert!(actor.id.is_none());
        assert_eq!(actor.name, "Auto Bot Mimic");
        assert_eq!(actor.role, ActorRole::BotMimic);
    }
}
