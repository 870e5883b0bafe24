use loumo_api_types::{Address, Id, Zone, ZoneRequest};

use crate::cache::{EntityKind, Mutation, MutationKind, QueryClient, QueryOptions};
use crate::infra::http::BackendClient;

use super::{AdminContext, Update, collection, data, discard};

#[derive(Clone)]
pub struct ZoneService {
    client: QueryClient,
    backend: BackendClient,
}

impl ZoneService {
    pub fn new(ctx: &AdminContext) -> Self {
        Self {
            client: ctx.client().clone(),
            backend: ctx.backend().clone(),
        }
    }

    pub fn list(&self) -> QueryOptions<Vec<Zone>> {
        collection(&self.backend, EntityKind::Zones.root(), "zones")
    }

    /// Addresses of one zone, cached under `["zones", id, "addresses"]` so
    /// zone invalidations cover them.
    pub fn addresses(&self, zone_id: Id) -> QueryOptions<Vec<Address>> {
        collection(
            &self.backend,
            EntityKind::Zones.item(zone_id).child("addresses"),
            format!("zones/{zone_id}/addresses"),
        )
    }

    pub fn create(&self) -> Mutation<ZoneRequest, Zone> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::ZoneCreated, move |request: ZoneRequest| {
            let backend = backend.clone();
            async move { data(backend.post("zones", &request).await) }
        })
    }

    pub fn update(&self) -> Mutation<Update<ZoneRequest>, Zone> {
        let backend = self.backend.clone();
        Mutation::for_kind(
            &self.client,
            MutationKind::ZoneUpdated,
            move |update: Update<ZoneRequest>| {
                let backend = backend.clone();
                async move {
                    let path = format!("zones/{}", update.id);
                    data(backend.put(&path, &update.body).await)
                }
            },
        )
    }

    pub fn delete(&self) -> Mutation<Id, ()> {
        let backend = self.backend.clone();
        Mutation::for_kind(&self.client, MutationKind::ZoneDeleted, move |id: Id| {
            let backend = backend.clone();
            async move { discard(backend.delete(&format!("zones/{id}")).await) }
        })
    }
}
