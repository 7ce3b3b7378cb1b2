use ligscreen::engine::config::ScreeningConfig;
use ligscreen::workflows::screen::ScreenRequest;

pub struct AppConfig {
    pub request: ScreenRequest,
    pub core_config: ScreeningConfig,
}
