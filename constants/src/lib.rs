/// Backend the development proxy forwards `/api` to
pub const BACKEND_URL: &str = "http://localhost:5000";
/// Roots used whenever no override applies
pub const DEFAULT_API_ROOT: &str = "/api";
pub const DEFAULT_ASSETS_ROOT: &str = "/assets";

/// Environment variables read at startup
pub const MODE_VAR: &str = "STUDIO_ENV";
pub const API_URL_VAR: &str = "STUDIO_API_URL";
pub const ASSETS_URL_VAR: &str = "STUDIO_ASSETS_URL";

/// Tracing target for everything touching the backend
pub const LOG_TARGET: &str = "api";

/// Endpoint groups
const CONFIG_PREFIX: &str = "/config";
const CHAT_PREFIX: &str = "/chat";
const GENERATE_PREFIX: &str = "/generate";

/// Endpoints
pub const HEALTH_ENDPOINT: &str = "/health";
pub const CONFIG_KEYS_ENDPOINT: &str = constcat::concat!(CONFIG_PREFIX, "/keys");
pub const CONFIG_HEALTH_ENDPOINT: &str = constcat::concat!(CONFIG_PREFIX, HEALTH_ENDPOINT);
pub const CHAT_ENDPOINT: &str = CHAT_PREFIX;
pub const CHAT_CLEAR_ENDPOINT: &str = constcat::concat!(CHAT_PREFIX, "/clear");
pub const CHAT_HISTORY_ENDPOINT: &str = constcat::concat!(CHAT_PREFIX, "/history");
pub const GENERATE_VIDEO_ENDPOINT: &str = constcat::concat!(GENERATE_PREFIX, "/video");
pub const GENERATE_SCRIPT_ENDPOINT: &str = constcat::concat!(GENERATE_PREFIX, "/script");
pub const GENERATE_AUDIO_ENDPOINT: &str = constcat::concat!(GENERATE_PREFIX, "/audio");
pub const GENERATE_IMAGES_ENDPOINT: &str = constcat::concat!(GENERATE_PREFIX, "/images");
pub const GENERATE_VIDEOS_ENDPOINT: &str = constcat::concat!(GENERATE_PREFIX, "/videos");
pub const GENERATE_RENDER_ENDPOINT: &str = constcat::concat!(GENERATE_PREFIX, "/render");
pub const EDITOR_EXPORT_ENDPOINT: &str = "/editor/export";
pub const HUGGINGFACE_IMAGE_TO_VIDEO_ENDPOINT: &str = "/huggingface/image-to-video";
