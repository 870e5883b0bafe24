use std::path::Path;

use loumo_api_types::{PageUpdateRequest, SettingsUpdateRequest};

use crate::application::admin::PageEdit;
use crate::application::error::AppError;
use crate::cli::{Ctx, print_json};
use crate::config::{PagesCmd, SettingsCmd, SettingsPatchArgs};
use crate::infra::error::InfraError;

pub async fn settings(ctx: &Ctx, cmd: SettingsCmd) -> Result<(), AppError> {
    let service = ctx.admin.content();
    match cmd {
        SettingsCmd::Show => print_json(&ctx.fetch(service.settings()).await?),
        SettingsCmd::Set(patch) => {
            let current = ctx.fetch(service.settings()).await?;
            let request = apply_settings_patch(SettingsUpdateRequest::from(current), patch);
            let updated = ctx.admin.submit(&service.update_settings(), request).await?;
            print_json(&updated)
        }
    }
}

pub async fn pages(ctx: &Ctx, cmd: PagesCmd) -> Result<(), AppError> {
    let service = ctx.admin.content();
    match cmd {
        PagesCmd::List => print_json(&ctx.fetch(service.pages()).await?),
        PagesCmd::Update {
            slug,
            title,
            body,
            body_file,
            published,
        } => {
            let body = match (body, body_file) {
                (Some(body), None) => body,
                (None, Some(path)) => read_body(&path).await?,
                (Some(_), Some(_)) => {
                    return Err(AppError::validation(
                        "body",
                        "use either --body or --body-file, not both",
                    ));
                }
                (None, None) => {
                    return Err(AppError::validation(
                        "body",
                        "provide --body or --body-file",
                    ));
                }
            };
            let edit = PageEdit {
                slug,
                body: PageUpdateRequest {
                    title,
                    body,
                    published,
                },
            };
            let page = ctx.admin.submit(&service.update_page(), edit).await?;
            print_json(&page)
        }
    }
}

/// Overlay the provided flags on the current settings.
pub(crate) fn apply_settings_patch(
    mut request: SettingsUpdateRequest,
    patch: SettingsPatchArgs,
) -> SettingsUpdateRequest {
    if let Some(store_name) = patch.store_name {
        request.store_name = store_name;
    }
    if let Some(contact_email) = patch.contact_email {
        request.contact_email = contact_email;
    }
    if let Some(contact_phone) = patch.contact_phone {
        request.contact_phone = Some(contact_phone);
    }
    if let Some(currency) = patch.currency {
        request.currency = currency;
    }
    if let Some(minimum_order) = patch.minimum_order {
        request.minimum_order = minimum_order;
    }
    if let Some(maintenance_mode) = patch.maintenance_mode {
        request.maintenance_mode = maintenance_mode;
    }
    request
}

async fn read_body(path: &Path) -> Result<String, AppError> {
    tokio::fs::read_to_string(path)
        .await
        .map_err(|err| AppError::from(InfraError::read_file(path, err)))
}
