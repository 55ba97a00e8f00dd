//! Custom piece requests.
//!
//! The form is multipart so a reference image can be attached. The image is
//! checked and inlined as a `data:` URL; everything else is validated by
//! [`CustomOrderForm`].

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State, multipart::Field},
    response::{IntoResponse, Response},
};
use tracing::instrument;

use super::views::PageContext;
use crate::api::ApiError;
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::OptionalAuth;
use crate::services::custom_order::{CustomOrderError, CustomOrderForm, ReferenceImage};
use crate::state::AppState;

/// Name of the file input.
const IMAGE_FIELD: &str = "imagen";

/// Shown after the backend accepted the request.
pub const CREATED_MESSAGE: &str =
    "Pedido personalizado creado exitosamente, pronto nos contactaremos contigo.";

/// Custom order page template.
#[derive(Template, WebTemplate)]
#[template(path = "custom_order.html")]
pub struct CustomOrderTemplate {
    pub ctx: PageContext,
    pub form: CustomOrderForm,
    pub error: Option<String>,
    pub success: Option<String>,
}

/// Display the request form, with contact details prefilled for customers.
#[instrument(skip(auth, ctx))]
pub async fn show(OptionalAuth(auth): OptionalAuth, ctx: PageContext) -> impl IntoResponse {
    let mut form = CustomOrderForm::default();
    if let Some(signed_in) = auth {
        form.nombre = signed_in.user.username;
        form.email = signed_in.user.email;
    }
    CustomOrderTemplate {
        ctx,
        form,
        error: None,
        success: None,
    }
}

/// Read the multipart body into the text fields and an optional image.
///
/// An empty file input means no image.
async fn read_form(
    multipart: &mut Multipart,
) -> Result<(CustomOrderForm, std::result::Result<Option<ReferenceImage>, CustomOrderError>)> {
    let mut form = CustomOrderForm::default();
    let mut image = Ok(None);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name == IMAGE_FIELD {
            image = read_image(field).await?;
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            form.set(&name, value);
        }
    }

    Ok((form, image))
}

async fn read_image(
    field: Field<'_>,
) -> Result<std::result::Result<Option<ReferenceImage>, CustomOrderError>> {
    let content_type = field.content_type().unwrap_or_default().to_string();
    let has_file = field.file_name().is_some_and(|name| !name.is_empty());
    let bytes = field
        .bytes()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?;

    if !has_file || bytes.is_empty() {
        return Ok(Ok(None));
    }
    Ok(ReferenceImage::new(&content_type, bytes.to_vec()).map(Some))
}

/// Validate and send a custom order request.
#[instrument(skip(state, auth, ctx, multipart))]
pub async fn submit(
    State(state): State<AppState>,
    OptionalAuth(auth): OptionalAuth,
    ctx: PageContext,
    mut multipart: Multipart,
) -> Result<Response> {
    let (form, image) = read_form(&mut multipart).await?;

    let rerender = |ctx: PageContext, form: CustomOrderForm, error: String| {
        CustomOrderTemplate {
            ctx,
            form,
            error: Some(error),
            success: None,
        }
        .into_response()
    };

    let image = image.as_ref().map(Option::as_ref).map_err(Clone::clone);
    let request = match form.to_request(image) {
        Ok(request) => request,
        Err(e) => return Ok(rerender(ctx, form, e.to_string())),
    };

    let token = auth.as_ref().map(|signed_in| &signed_in.token);
    match state.backend().create_custom_order(token, &request).await {
        Ok(receipt) => {
            tracing::info!(
                order_number = receipt.order_number().map_or("-", |n| n.as_str()),
                with_image = request.imagen_referencia.is_some(),
                "custom order created"
            );
            Ok(CustomOrderTemplate {
                ctx,
                form: CustomOrderForm::default(),
                error: None,
                success: Some(CREATED_MESSAGE.to_string()),
            }
            .into_response())
        }
        Err(ApiError::Unauthorized) if token.is_some() => Err(AppError::SessionExpired),
        Err(e) => {
            tracing::warn!(error = %e, "custom order refused");
            Ok(rerender(ctx, form, e.user_message()))
        }
    }
}
