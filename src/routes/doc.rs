use utoipa::{OpenApi, openapi::OpenApi as OpenApiSpec};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        SuccessResponse,
        auth::{LoginRequest, LoginResponse, SignupRequest},
        orders::{LineItemInput, OrderPlaced, PlaceOrderRequest, UpdateStatusRequest},
        products::{ProductCreated, ProductPayload},
        reviews::CreateReviewRequest,
    },
    models::{OrderLine, OrderSummary, Product, PublicUser, Review},
    routes::{auth, health, orders, products, reviews},
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        products::list_products,
        products::create_product,
        products::update_product,
        products::delete_product,
        orders::list_orders,
        orders::place_order,
        orders::delete_order,
        orders::set_status,
        reviews::create_review,
        reviews::list_reviews,
    ),
    components(
        schemas(
            PublicUser,
            Product,
            OrderSummary,
            OrderLine,
            Review,
            SuccessResponse,
            SignupRequest,
            LoginRequest,
            LoginResponse,
            PlaceOrderRequest,
            LineItemInput,
            OrderPlaced,
            UpdateStatusRequest,
            ProductPayload,
            ProductCreated,
            CreateReviewRequest,
        )
    ),
    tags(
        (name = "Health", description = "Backend health probe"),
        (name = "Auth", description = "Signup and login"),
        (name = "Products", description = "Catalog endpoints"),
        (name = "Orders", description = "Order placement and administration"),
        (name = "Reviews", description = "Product reviews"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
