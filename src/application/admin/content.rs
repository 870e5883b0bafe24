use loumo_api_types::{PageRecord, PageUpdateRequest, SettingsRecord, SettingsUpdateRequest};

use crate::cache::{EntityKind, Mutation, MutationKind, QueryClient, QueryOptions};
use crate::domain::error::DomainError;
use crate::domain::validation::Validate;
use crate::infra::http::BackendClient;

use super::{AdminContext, collection, data};

/// Page edit addressed by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageEdit {
    pub slug: String,
    pub body: PageUpdateRequest,
}

impl Validate for PageEdit {
    fn validate(&mut self) -> Result<(), DomainError> {
        let slug = self.slug.trim();
        if slug.is_empty() || slug.contains('/') {
            return Err(DomainError::validation(
                "slug",
                "must be a single non-empty path segment",
            ));
        }
        self.slug = slug.to_string();
        self.body.validate()
    }
}

/// Store settings and CMS pages.
#[derive(Clone)]
pub struct ContentService {
    client: QueryClient,
    backend: BackendClient,
}

impl ContentService {
    pub fn new(ctx: &AdminContext) -> Self {
        Self {
            client: ctx.client().clone(),
            backend: ctx.backend().clone(),
        }
    }

    pub fn settings(&self) -> QueryOptions<SettingsRecord> {
        collection(&self.backend, EntityKind::Settings.root(), "settings")
    }

    pub fn pages(&self) -> QueryOptions<Vec<PageRecord>> {
        collection(&self.backend, EntityKind::Pages.root(), "pages")
    }

    pub fn update_settings(&self) -> Mutation<SettingsUpdateRequest, SettingsRecord> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::SettingsUpdated,
            move |request: SettingsUpdateRequest| {
                let backend = backend.clone();
                async move { data(backend.put("settings", &request).await) }
            },
        )
    }

    pub fn update_page(&self) -> Mutation<PageEdit, PageRecord> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::PageUpdated, move |edit: PageEdit| {
            let backend = backend.clone();
            async move {
                let path = format!("pages/{}", edit.slug);
                data(backend.put(&path, &edit.body).await)
            }
        })
    }
}
