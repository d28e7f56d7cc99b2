use std::{fmt, str::FromStr};

use color_eyre::eyre::{Report, eyre};
use serde::Serialize;

/// Logical name of a backend operation
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Endpoint {
    Health,
    ConfigKeys,
    ConfigHealth,
    Chat,
    ChatClear,
    ChatHistory,
    GenerateVideo,
    GenerateScript,
    GenerateAudio,
    GenerateImages,
    GenerateVideos,
    GenerateRender,
    EditorExport,
    HuggingfaceImageToVideo,
}

impl Endpoint {
    pub const ALL: [Endpoint; 14] = [
        Endpoint::Health,
        Endpoint::ConfigKeys,
        Endpoint::ConfigHealth,
        Endpoint::Chat,
        Endpoint::ChatClear,
        Endpoint::ChatHistory,
        Endpoint::GenerateVideo,
        Endpoint::GenerateScript,
        Endpoint::GenerateAudio,
        Endpoint::GenerateImages,
        Endpoint::GenerateVideos,
        Endpoint::GenerateRender,
        Endpoint::EditorExport,
        Endpoint::HuggingfaceImageToVideo,
    ];

    /// Key of the endpoint in the exported mapping
    pub const fn key(self) -> &'static str {
        match self {
            Endpoint::Health => "health",
            Endpoint::ConfigKeys => "configKeys",
            Endpoint::ConfigHealth => "configHealth",
            Endpoint::Chat => "chat",
            Endpoint::ChatClear => "chatClear",
            Endpoint::ChatHistory => "chatHistory",
            Endpoint::GenerateVideo => "generateVideo",
            Endpoint::GenerateScript => "generateScript",
            Endpoint::GenerateAudio => "generateAudio",
            Endpoint::GenerateImages => "generateImages",
            Endpoint::GenerateVideos => "generateVideos",
            Endpoint::GenerateRender => "generateRender",
            Endpoint::EditorExport => "editorExport",
            Endpoint::HuggingfaceImageToVideo => "huggingfaceImageToVideo",
        }
    }

    pub const fn path(self) -> &'static str {
        match self {
            Endpoint::Health => constants::HEALTH_ENDPOINT,
            Endpoint::ConfigKeys => constants::CONFIG_KEYS_ENDPOINT,
            Endpoint::ConfigHealth => constants::CONFIG_HEALTH_ENDPOINT,
            Endpoint::Chat => constants::CHAT_ENDPOINT,
            Endpoint::ChatClear => constants::CHAT_CLEAR_ENDPOINT,
            Endpoint::ChatHistory => constants::CHAT_HISTORY_ENDPOINT,
            Endpoint::GenerateVideo => constants::GENERATE_VIDEO_ENDPOINT,
            Endpoint::GenerateScript => constants::GENERATE_SCRIPT_ENDPOINT,
            Endpoint::GenerateAudio => constants::GENERATE_AUDIO_ENDPOINT,
            Endpoint::GenerateImages => constants::GENERATE_IMAGES_ENDPOINT,
            Endpoint::GenerateVideos => constants::GENERATE_VIDEOS_ENDPOINT,
            Endpoint::GenerateRender => constants::GENERATE_RENDER_ENDPOINT,
            Endpoint::EditorExport => constants::EDITOR_EXPORT_ENDPOINT,
            Endpoint::HuggingfaceImageToVideo => constants::HUGGINGFACE_IMAGE_TO_VIDEO_ENDPOINT,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Accepts the camelCase key as well as its kebab-case spelling
impl FromStr for Endpoint {
    type Err = Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Endpoint::ALL
            .into_iter()
            .find(|endpoint| endpoint.key() == s || kebab_case(endpoint.key()) == s)
            .ok_or_else(|| eyre!("unknown endpoint `{s}`"))
    }
}

fn kebab_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Fixed mapping of endpoint keys to relative paths
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    pub health: &'static str,
    pub config_keys: &'static str,
    pub config_health: &'static str,
    pub chat: &'static str,
    pub chat_clear: &'static str,
    pub chat_history: &'static str,
    pub generate_video: &'static str,
    pub generate_script: &'static str,
    pub generate_audio: &'static str,
    pub generate_images: &'static str,
    pub generate_videos: &'static str,
    pub generate_render: &'static str,
    pub editor_export: &'static str,
    pub huggingface_image_to_video: &'static str,
}

impl Endpoints {
    pub const fn new() -> Self {
        Self {
            health: Endpoint::Health.path(),
            config_keys: Endpoint::ConfigKeys.path(),
            config_health: Endpoint::ConfigHealth.path(),
            chat: Endpoint::Chat.path(),
            chat_clear: Endpoint::ChatClear.path(),
            chat_history: Endpoint::ChatHistory.path(),
            generate_video: Endpoint::GenerateVideo.path(),
            generate_script: Endpoint::GenerateScript.path(),
            generate_audio: Endpoint::GenerateAudio.path(),
            generate_images: Endpoint::GenerateImages.path(),
            generate_videos: Endpoint::GenerateVideos.path(),
            generate_render: Endpoint::GenerateRender.path(),
            editor_export: Endpoint::EditorExport.path(),
            huggingface_image_to_video: Endpoint::HuggingfaceImageToVideo.path(),
        }
    }

    pub const fn get(&self, endpoint: Endpoint) -> &'static str {
        match endpoint {
            Endpoint::Health => self.health,
            Endpoint::ConfigKeys => self.config_keys,
            Endpoint::ConfigHealth => self.config_health,
            Endpoint::Chat => self.chat,
            Endpoint::ChatClear => self.chat_clear,
            Endpoint::ChatHistory => self.chat_history,
            Endpoint::GenerateVideo => self.generate_video,
            Endpoint::GenerateScript => self.generate_script,
            Endpoint::GenerateAudio => self.generate_audio,
            Endpoint::GenerateImages => self.generate_images,
            Endpoint::GenerateVideos => self.generate_videos,
            Endpoint::GenerateRender => self.generate_render,
            Endpoint::EditorExport => self.editor_export,
            Endpoint::HuggingfaceImageToVideo => self.huggingface_image_to_video,
        }
    }

    /// `(key, path)` pairs in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &'static str)> + '_ {
        Endpoint::ALL
            .into_iter()
            .map(move |endpoint| (endpoint.key(), self.get(endpoint)))
    }
}

impl Default for Endpoints {
    fn default() -> Self {
        Self::new()
    }
}
