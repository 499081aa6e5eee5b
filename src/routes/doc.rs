use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        auth::{
            AuthResponse, LoginRequest, PasswordResetConfirm, PasswordResetRequest,
            PasswordResetRequestResponse, RefreshTokenRequest, RefreshTokenResponse,
            RegisterRequest, ResendVerificationResponse, RevokeSessionRequest, SessionInfo,
            SessionList, VerifyEmailResponse,
        },
        cart::{AddToCartRequest, CartItemCount, UpdateQuantityRequest},
        category::{
            CategoryList, CreateCategoryRequest, DeleteCategoryResponse, UpdateCategoryRequest,
        },
        inventory::{
            AvailabilityResponse, CreateInventoryRequest, InventoryList, UpdateInventoryRequest,
        },
        products::{
            CreateProductRequest, CreateVariantRequest, DeleteResponse, ProductList,
            UpdateProductRequest, UpdateVariantRequest, VariantList,
        },
    },
    models::{Cart, CartItem, Category, Inventory, Product, ProductImage, ProductVariant, User},
    response::{ApiResponse, Meta},
    routes::{auth, cart, category, health, inventory, products, user},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::request_password_reset,
        auth::reset_password,
        user::profile,
        user::logout,
        user::refresh_token,
        user::list_sessions,
        user::revoke_session,
        user::verify_email,
        user::resend_verification,
        category::create_category,
        category::list_categories,
        category::update_category,
        category::delete_category,
        products::create_product,
        products::list_products,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::create_variant,
        products::list_variants,
        products::get_variant,
        products::update_variant,
        products::delete_variant,
        products::add_image,
        products::delete_image,
        inventory::create_inventory,
        inventory::get_by_variant,
        inventory::update_inventory,
        inventory::check_availability,
        cart::add_to_cart,
        cart::get_cart,
        cart::count_items,
        cart::clear_cart,
        cart::update_quantity,
        cart::remove_item,
    ),
    components(
        schemas(
            User,
            Category,
            Product,
            ProductVariant,
            ProductImage,
            Inventory,
            Cart,
            CartItem,
            RegisterRequest,
            LoginRequest,
            AuthResponse,
            SessionInfo,
            SessionList,
            RefreshTokenRequest,
            RefreshTokenResponse,
            RevokeSessionRequest,
            VerifyEmailResponse,
            ResendVerificationResponse,
            PasswordResetRequest,
            PasswordResetRequestResponse,
            PasswordResetConfirm,
            CreateCategoryRequest,
            UpdateCategoryRequest,
            CategoryList,
            DeleteCategoryResponse,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            CreateVariantRequest,
            UpdateVariantRequest,
            VariantList,
            DeleteResponse,
            CreateInventoryRequest,
            UpdateInventoryRequest,
            InventoryList,
            AvailabilityResponse,
            AddToCartRequest,
            UpdateQuantityRequest,
            CartItemCount,
            health::HealthData,
            Meta,
            ApiResponse<Cart>,
            ApiResponse<CartItem>,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<CategoryList>,
            ApiResponse<AuthResponse>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Registration, login, password reset"),
        (name = "User", description = "Profile, sessions, verification"),
        (name = "Category", description = "Category tree endpoints"),
        (name = "Products", description = "Product, variant and image endpoints"),
        (name = "Inventory", description = "Per-(variant, size) stock endpoints"),
        (name = "Cart", description = "Cart endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
