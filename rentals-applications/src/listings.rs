//! Listing management

use rentals_core::{
    not_found_error, validation_error, Listing, ListingFilter, ListingPatch, NewListing,
    RentalsResult, Role, Store,
};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn Store>,
}

impl ListingService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Listings must point at an existing realtor
    async fn check_realtor(&self, realtor_id: &str) -> RentalsResult<()> {
        match self.store.get_account(realtor_id).await? {
            Some(account) if account.role == Role::Realtor => Ok(()),
            Some(_) => Err(validation_error!(
                format!("account {} is not a realtor", realtor_id),
                "realtorId",
                "listings"
            )),
            None => Err(validation_error!(
                format!("realtor {} does not exist", realtor_id),
                "realtorId",
                "listings"
            )),
        }
    }

    fn check_fields(listing: &Listing) -> RentalsResult<()> {
        if listing.name.trim().is_empty() {
            return Err(validation_error!("name must not be empty", "name", "listings"));
        }
        if listing.floor_area_meters.is_nan() || listing.floor_area_meters <= 0.0 {
            return Err(validation_error!(
                "floor area must be positive",
                "floorAreaMeters",
                "listings"
            ));
        }
        if listing.price_per_month_usd < 0.0 {
            return Err(validation_error!(
                "price must not be negative",
                "pricePerMonthUSD",
                "listings"
            ));
        }
        if !(-90.0..=90.0).contains(&listing.latitude) {
            return Err(validation_error!("latitude out of range", "latitude", "listings"));
        }
        if !(-180.0..=180.0).contains(&listing.longitude) {
            return Err(validation_error!("longitude out of range", "longitude", "listings"));
        }
        Ok(())
    }

    pub async fn create(&self, new: NewListing) -> RentalsResult<Listing> {
        let listing = new.into_listing();
        Self::check_fields(&listing)?;
        self.check_realtor(&listing.realtor_id).await?;

        self.store.create_listing(&listing).await?;
        info!(listing_id = %listing.id, realtor_id = %listing.realtor_id, "Listing created");
        Ok(listing)
    }

    pub async fn get(&self, id: &str) -> RentalsResult<Listing> {
        self.store
            .get_listing(id)
            .await?
            .ok_or_else(|| not_found_error!(format!("listing {}", id), "listings"))
    }

    pub async fn find(&self, filter: &ListingFilter) -> RentalsResult<Vec<Listing>> {
        let listings = self.store.find_listings(filter).await?;
        debug!(count = listings.len(), ?filter, "Listings found");
        Ok(listings)
    }

    pub async fn update(&self, id: &str, patch: ListingPatch) -> RentalsResult<Listing> {
        let mut listing = self.get(id).await?;
        let realtor_changed = patch
            .realtor_id
            .as_ref()
            .is_some_and(|realtor_id| *realtor_id != listing.realtor_id);

        patch.apply(&mut listing);
        Self::check_fields(&listing)?;
        if realtor_changed {
            self.check_realtor(&listing.realtor_id).await?;
        }

        self.store.save_listing(&listing).await?;
        debug!(listing_id = %listing.id, "Listing updated");
        Ok(listing)
    }

    pub async fn delete(&self, id: &str) -> RentalsResult<()> {
        if !self.store.delete_listing(id).await? {
            return Err(not_found_error!(format!("listing {}", id), "listings"));
        }
        info!(listing_id = %id, "Listing deleted");
        Ok(())
    }
}
