// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Listing creation state machine.
//!
//! ```text
//! Type -> Basics -> Details -> Photos -> Location -> Visibility -> submit
//! ```
//!
//! Location is skipped in both directions for digital listings. Lost and
//! found posts are never digital and never carry a price.

use axum::body::Bytes;
use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use super::FlowError;
use crate::{
    backend::BackendClient,
    models::{ProductType, ProductVisibility},
};

/// Upload limit per listing.
pub const MAX_IMAGES: usize = 5;

pub const TOTAL_STEPS: u8 = 6;

/// Where the client goes after a successful submission, and when.
pub const SUBMIT_REDIRECT: &str = "/dashboard";
pub const SUBMIT_REDIRECT_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingStep {
    Type,
    Basics,
    Details,
    Photos,
    Location,
    Visibility,
}

impl ListingStep {
    pub fn number(self) -> u8 {
        match self {
            ListingStep::Type => 1,
            ListingStep::Basics => 2,
            ListingStep::Details => 3,
            ListingStep::Photos => 4,
            ListingStep::Location => 5,
            ListingStep::Visibility => 6,
        }
    }
}

/// Input for the current step, tagged by step name.
///
/// ```json
/// { "step": "basics", "title": "Blue Calculator", "is_digital": false }
/// ```
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepInput {
    Type {
        product_type: ProductType,
    },
    Basics {
        title: String,
        /// Name of a category to create alongside the listing.
        #[serde(default)]
        category_name: Option<String>,
        #[serde(default)]
        is_digital: bool,
    },
    Details {
        description: String,
        /// Decimal string; ignored for lost and found posts.
        #[serde(default)]
        price: Option<String>,
    },
    /// Leave the photo step. Images are uploaded separately.
    Photos {},
    Location {
        city: String,
    },
    Visibility {
        visibility: ProductVisibility,
    },
}

/// An image held in memory until submission.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftImage {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Bytes,
}

impl DraftImage {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Bytes,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DraftImageView {
    pub id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size: usize,
}

/// Snapshot returned to the client after every transition.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DraftView {
    pub step: ListingStep,
    pub step_number: u8,
    pub total_steps: u8,
    /// Fraction of steps reached, `step / 6`.
    pub progress: f32,
    pub product_type: Option<ProductType>,
    pub title: String,
    pub category_name: String,
    pub is_digital: bool,
    pub description: String,
    pub price: Option<String>,
    pub city: String,
    pub visibility: ProductVisibility,
    pub images: Vec<DraftImageView>,
}

/// Result of a successful submission.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmitOutcome {
    pub slug: Option<String>,
    pub redirect_to: String,
    pub redirect_after_ms: u64,
}

/// Multipart body for `POST /api/products/`.
#[derive(Debug, Clone)]
pub struct ListingPayload {
    pub fields: Vec<(&'static str, String)>,
    pub files: Vec<DraftImage>,
}

impl ListingPayload {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn into_form(self) -> Form {
        let form = self
            .fields
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        self.files.into_iter().fold(form, |form, image| {
            let part = Part::bytes(image.bytes.to_vec()).file_name(image.file_name.clone());
            // Unparseable content types are sent without one
            let part = part.mime_str(&image.content_type).unwrap_or_else(|_| {
                Part::bytes(image.bytes.to_vec()).file_name(image.file_name)
            });
            form.part("files", part)
        })
    }
}

/// An in-progress listing.
#[derive(Debug, Clone, Default)]
pub struct ListingDraft {
    step: Option<ListingStep>,
    product_type: Option<ProductType>,
    title: String,
    category_name: String,
    is_digital: bool,
    description: String,
    price: Option<String>,
    city: String,
    visibility: ProductVisibility,
    images: Vec<DraftImage>,
}

fn parse_price(raw: &str) -> Result<String, FlowError> {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 => Ok(raw.to_string()),
        _ => Err(FlowError::invalid("Price must be a non-negative number")),
    }
}

fn required(value: &str, message: &str) -> Result<String, FlowError> {
    let value = value.trim();
    if value.is_empty() {
        Err(FlowError::invalid(message))
    } else {
        Ok(value.to_string())
    }
}

impl ListingDraft {
    /// New draft. A type hint skips the type step.
    pub fn new(type_hint: Option<ProductType>) -> Self {
        let mut draft = Self::default();
        match type_hint {
            Some(product_type) => {
                draft.set_type(product_type);
                draft.step = Some(ListingStep::Basics);
            }
            None => draft.step = Some(ListingStep::Type),
        }
        draft
    }

    pub fn step(&self) -> ListingStep {
        self.step.unwrap_or(ListingStep::Type)
    }

    pub fn progress(&self) -> f32 {
        f32::from(self.step().number()) / f32::from(TOTAL_STEPS)
    }

    fn is_lost_or_found(&self) -> bool {
        self.product_type.is_some_and(|t| t.is_lost_or_found())
    }

    fn set_type(&mut self, product_type: ProductType) {
        self.product_type = Some(product_type);
        if product_type.is_lost_or_found() {
            self.is_digital = false;
        }
    }

    pub fn view(&self) -> DraftView {
        DraftView {
            step: self.step(),
            step_number: self.step().number(),
            total_steps: TOTAL_STEPS,
            progress: self.progress(),
            product_type: self.product_type,
            title: self.title.clone(),
            category_name: self.category_name.clone(),
            is_digital: self.is_digital,
            description: self.description.clone(),
            price: self.price.clone(),
            city: self.city.clone(),
            visibility: self.visibility,
            images: self
                .images
                .iter()
                .map(|image| DraftImageView {
                    id: image.id,
                    file_name: image.file_name.clone(),
                    content_type: image.content_type.clone(),
                    size: image.bytes.len(),
                })
                .collect(),
        }
    }

    fn next_step(&self) -> ListingStep {
        match self.step() {
            ListingStep::Type => ListingStep::Basics,
            ListingStep::Basics => ListingStep::Details,
            ListingStep::Details => ListingStep::Photos,
            ListingStep::Photos if self.is_digital => ListingStep::Visibility,
            ListingStep::Photos => ListingStep::Location,
            ListingStep::Location | ListingStep::Visibility => ListingStep::Visibility,
        }
    }

    /// Step back once, skipping Location for digital listings.
    pub fn back(&mut self) -> ListingStep {
        let previous = match self.step() {
            ListingStep::Type | ListingStep::Basics => ListingStep::Type,
            ListingStep::Details => ListingStep::Basics,
            ListingStep::Photos => ListingStep::Details,
            ListingStep::Location => ListingStep::Photos,
            ListingStep::Visibility if self.is_digital => ListingStep::Photos,
            ListingStep::Visibility => ListingStep::Location,
        };
        self.step = Some(previous);
        previous
    }

    /// Apply the input for the current step and advance.
    ///
    /// Visibility does not advance; the next move from there is submission.
    pub fn apply(&mut self, input: StepInput) -> Result<ListingStep, FlowError> {
        match (self.step(), input) {
            (ListingStep::Type, StepInput::Type { product_type }) => {
                self.set_type(product_type);
            }
            (
                ListingStep::Basics,
                StepInput::Basics {
                    title,
                    category_name,
                    is_digital,
                },
            ) => {
                self.title = required(&title, "Title is required")?;
                self.category_name = category_name.unwrap_or_default().trim().to_string();
                self.is_digital = is_digital && !self.is_lost_or_found();
            }
            (ListingStep::Details, StepInput::Details { description, price }) => {
                let description = required(&description, "Description is required")?;
                let price = match price.as_deref().map(str::trim) {
                    _ if self.is_lost_or_found() => None,
                    Some(raw) if !raw.is_empty() => Some(parse_price(raw)?),
                    _ => None,
                };
                self.description = description;
                self.price = price;
            }
            (ListingStep::Photos, StepInput::Photos {}) => {}
            (ListingStep::Location, StepInput::Location { city }) => {
                self.city = required(&city, "City is required")?;
            }
            (ListingStep::Visibility, StepInput::Visibility { visibility }) => {
                self.visibility = visibility;
            }
            _ => return Err(FlowError::WrongStep),
        }

        let next = self.next_step();
        self.step = Some(next);
        Ok(next)
    }

    pub fn add_image(&mut self, image: DraftImage) -> Result<(), FlowError> {
        if self.step() != ListingStep::Photos {
            return Err(FlowError::WrongStep);
        }
        if self.images.len() >= MAX_IMAGES {
            return Err(FlowError::invalid(format!(
                "You can upload at most {MAX_IMAGES} images"
            )));
        }
        self.images.push(image);
        Ok(())
    }

    pub fn remove_image(&mut self, index: usize) -> Result<DraftImage, FlowError> {
        if self.step() != ListingStep::Photos {
            return Err(FlowError::WrongStep);
        }
        if index >= self.images.len() {
            return Err(FlowError::invalid(format!("No image at position {index}")));
        }
        Ok(self.images.remove(index))
    }

    /// Build the multipart payload, enforcing the conditional field rules.
    pub fn payload(&self) -> Result<ListingPayload, FlowError> {
        let product_type = self
            .product_type
            .ok_or_else(|| FlowError::invalid("Choose a listing type"))?;
        let title = required(&self.title, "Title is required")?;
        let description = required(&self.description, "Description is required")?;

        let mut fields = vec![
            ("title", title),
            ("description", description),
            ("product_type", product_type.as_str().to_string()),
            ("visibility", self.visibility.as_str().to_string()),
            ("is_digital", self.is_digital.to_string()),
        ];

        if !product_type.is_lost_or_found() {
            if let Some(price) = &self.price {
                fields.push(("price", price.clone()));
            }
        }

        if !self.is_digital {
            fields.push(("city", required(&self.city, "City is required")?));
        }

        if !self.category_name.is_empty() {
            fields.push(("new_category_name", self.category_name.clone()));
        }

        Ok(ListingPayload {
            fields,
            files: self.images.clone(),
        })
    }

    /// Post the listing. On failure the draft stays on Visibility.
    pub async fn submit(
        &self,
        backend: &BackendClient,
        token: &str,
    ) -> Result<SubmitOutcome, FlowError> {
        if self.step() != ListingStep::Visibility {
            return Err(FlowError::WrongStep);
        }
        let payload = self.payload()?;

        let created = backend
            .create_product(token, payload.into_form())
            .await
            .map_err(|e| FlowError::backend("Failed to create", e))?;

        info!(slug = ?created.slug, images = self.images.len(), "Listing created");
        Ok(SubmitOutcome {
            slug: created.slug,
            redirect_to: SUBMIT_REDIRECT.to_string(),
            redirect_after_ms: SUBMIT_REDIRECT_DELAY_MS,
        })
    }
}
