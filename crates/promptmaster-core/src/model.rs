pub const MODEL_PRO: &str = "gemini-3-pro-preview";
pub const MODEL_FLASH_LITE: &str = "gemini-flash-lite-latest";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelTier {
    /// Structured generation, playground runs and the tutor chat
    Pro,
    /// Low-latency quick refine
    FlashLite,
}

impl ModelTier {
    pub fn default_model(&self) -> &'static str {
        match self {
            ModelTier::Pro => MODEL_PRO,
            ModelTier::FlashLite => MODEL_FLASH_LITE,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ModelTier::Pro => "Gemini Pro",
            ModelTier::FlashLite => "Gemini Flash Lite",
        }
    }
}

/// Model names the gateway uses for each tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    pub pro: String,
    pub lite: String,
}

impl ModelSelection {
    pub fn name(&self, tier: ModelTier) -> &str {
        match tier {
            ModelTier::Pro => &self.pro,
            ModelTier::FlashLite => &self.lite,
        }
    }
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            pro: MODEL_PRO.to_string(),
            lite: MODEL_FLASH_LITE.to_string(),
        }
    }
}
