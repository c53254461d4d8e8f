//! API routes.

pub mod callback;
pub mod coupons;
pub mod health;
pub mod sites;

pub use callback::{CallbackRequest, CallbackResponse, callback_handler};
pub use coupons::{
    AddCouponRequest, CouponLookupResponse, CouponQuery, add_coupon_handler, get_coupons_handler,
};
pub use health::health_routes;
pub use sites::{SiteRequest, add_site_handler};
