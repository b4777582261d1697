use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{Endpoint, EndpointKind};
use crate::{
    error::{Result, TextSynthError},
    validation::{Validate, check_finite, check_min, check_one_of, check_range, require_non_empty},
};

/// Image sizes supported by the `text_to_image` endpoint, in pixels.
pub const IMAGE_SIZES: [u32; 4] = [384, 512, 640, 768];

/// Options for the `text_to_image` endpoint.
///
/// # Fields
/// * `image_count` - Number of images to generate (1 to 4)
/// * `width`, `height` - Image size, one of [`IMAGE_SIZES`]
/// * `timesteps` - Number of diffusion steps (at least 1)
/// * `guidance_scale` - How closely to follow the prompt (at least 0)
/// * `image` - Optional base64 JPEG used as a starting point
/// * `strength` - How much to alter the starting image (0.0 to 1.0)
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct TextToImageOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timesteps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guidance_scale: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

impl TextToImageOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(value: Value) -> Result<Self> {
        let options: TextToImageOptions = serde_json::from_value(value)
            .map_err(|e| TextSynthError::Validation(format!("invalid text_to_image options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn image_count(mut self, image_count: u32) -> Self {
        self.image_count = Some(image_count);
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }

    pub fn timesteps(mut self, timesteps: u32) -> Self {
        self.timesteps = Some(timesteps);
        self
    }

    pub fn guidance_scale(mut self, guidance_scale: f64) -> Self {
        self.guidance_scale = Some(guidance_scale);
        self
    }

    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn negative_prompt<S: Into<String>>(mut self, negative_prompt: S) -> Self {
        self.negative_prompt = Some(negative_prompt.into());
        self
    }

    /// Starts from an existing JPEG image, given as raw bytes.
    pub fn init_image(mut self, jpeg: &[u8], strength: f64) -> Self {
        use base64::{Engine as _, engine::general_purpose::STANDARD};
        self.image = Some(STANDARD.encode(jpeg));
        self.strength = Some(strength);
        self
    }
}

impl Validate for TextToImageOptions {
    fn validate(&self) -> Result<()> {
        check_range("image_count", self.image_count, 1, 4)?;
        check_one_of("width", self.width, &IMAGE_SIZES)?;
        check_one_of("height", self.height, &IMAGE_SIZES)?;
        check_min("timesteps", self.timesteps, 1)?;
        check_finite("guidance_scale", self.guidance_scale)?;
        check_min("guidance_scale", self.guidance_scale, 0.0)?;
        check_range("strength", self.strength, 0.0, 1.0)?;
        if let Some(image) = &self.image {
            require_non_empty("image", image)?;
        }
        Ok(())
    }
}

/// Body of a `text_to_image` request.
#[derive(Serialize, Debug, Clone, Copy)]
pub struct TextToImageRequest<'a> {
    pub prompt: &'a str,
    #[serde(flatten)]
    pub options: &'a TextToImageOptions,
}

impl<'a> TextToImageRequest<'a> {
    pub fn new(prompt: &'a str, options: &'a TextToImageOptions) -> Self {
        Self { prompt, options }
    }
}

impl Validate for TextToImageRequest<'_> {
    fn validate(&self) -> Result<()> {
        require_non_empty("prompt", self.prompt)?;
        self.options.validate()
    }
}

impl Endpoint for TextToImageRequest<'_> {
    type Response = TextToImage;
    const KIND: EndpointKind = EndpointKind::TextToImage;
}

/// Response from the `text_to_image` endpoint.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TextToImage {
    pub images: Vec<GeneratedImage>,
    #[serde(skip)]
    raw_json: Value,
}

impl_answer!(TextToImage);

/// One generated image. The bytes are a JPEG file and can be written out as-is.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct GeneratedImage {
    #[serde(deserialize_with = "super::base64_data::bytes")]
    pub data: Vec<u8>,
}
