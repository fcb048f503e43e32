use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 投稿先のソーシャルプラットフォーム
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Platform {
    Tiktok,
    Instagram,
    Twitter,
    Facebook,
    Linkedin,
    Youtube,
    AmazonLive,
    Pinterest,
    Snapchat,
    Twitch,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Tiktok => "tiktok",
            Platform::Instagram => "instagram",
            Platform::Twitter => "twitter",
            Platform::Facebook => "facebook",
            Platform::Linkedin => "linkedin",
            Platform::Youtube => "youtube",
            Platform::AmazonLive => "amazon_live",
            Platform::Pinterest => "pinterest",
            Platform::Snapchat => "snapchat",
            Platform::Twitch => "twitch",
        }
    }

    /// 本文の最大文字数
    pub fn character_limit(&self) -> usize {
        match self {
            Platform::Tiktok | Platform::Instagram => 2200,
            Platform::Twitter => 280,
            Platform::Facebook => 63206,
            Platform::Linkedin => 3000,
            Platform::Youtube => 5000,
            Platform::Pinterest | Platform::AmazonLive | Platform::Twitch => 500,
            Platform::Snapchat => 250,
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tiktok" => Ok(Platform::Tiktok),
            "instagram" => Ok(Platform::Instagram),
            "twitter" | "x" => Ok(Platform::Twitter),
            "facebook" => Ok(Platform::Facebook),
            "linkedin" => Ok(Platform::Linkedin),
            "youtube" => Ok(Platform::Youtube),
            "amazon_live" => Ok(Platform::AmazonLive),
            "pinterest" => Ok(Platform::Pinterest),
            "snapchat" => Ok(Platform::Snapchat),
            "twitch" => Ok(Platform::Twitch),
            other => Err(format!("Unknown platform: {other}")),
        }
    }
}
