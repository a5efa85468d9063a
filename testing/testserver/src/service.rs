use tonic::{Request, Response, Status};

use crate::pb;

pub struct HealthImpl;

#[tonic::async_trait]
impl pb::health_server::Health for HealthImpl {
    async fn check(
        &self,
        _request: Request<pb::HealthCheckRequest>,
    ) -> Result<Response<pb::HealthCheckResponse>, Status> {
        Ok(Response::new(pb::HealthCheckResponse {
            status: pb::health_check_response::ServingStatus::Serving as i32,
        }))
    }
}

pub struct GreeterImpl;

#[tonic::async_trait]
impl pb::greeter_server::Greeter for GreeterImpl {
    async fn say_hello(
        &self,
        request: Request<pb::HelloRequest>,
    ) -> Result<Response<pb::HelloReply>, Status> {
        let name = request.into_inner().name;
        Ok(Response::new(pb::HelloReply {
            message: format!("Hello, {name}!"),
        }))
    }
}

/// Implements Login/Register/GetProfile/GetById for real, gates GetUser
/// behind authentication, and leaves every other method (Logout among
/// them) to fall through to tonic's generated `unimplemented` handler.
pub struct UserServiceImpl;

#[tonic::async_trait]
impl pb::user_service_server::UserService for UserServiceImpl {
    async fn login(
        &self,
        _request: Request<pb::LoginRequest>,
    ) -> Result<Response<pb::LoginResponse>, Status> {
        Ok(Response::new(pb::LoginResponse {
            token: "test-token".to_string(),
        }))
    }

    async fn register(
        &self,
        _request: Request<pb::RegisterRequest>,
    ) -> Result<Response<pb::RegisterResponse>, Status> {
        Ok(Response::new(pb::RegisterResponse {
            user_id: "1".to_string(),
        }))
    }

    async fn get_profile(
        &self,
        _request: Request<pb::GetProfileRequest>,
    ) -> Result<Response<pb::GetProfileResponse>, Status> {
        Ok(Response::new(pb::GetProfileResponse {
            username: "testuser".to_string(),
        }))
    }

    async fn get_user(
        &self,
        _request: Request<pb::GetUserRequest>,
    ) -> Result<Response<pb::GetUserResponse>, Status> {
        Err(Status::unauthenticated("missing bearer token"))
    }

    async fn get_by_id(
        &self,
        request: Request<pb::GetByIdRequest>,
    ) -> Result<Response<pb::GetByIdResponse>, Status> {
        let id = request.into_inner().id;
        if id.is_empty() {
            return Err(Status::invalid_argument("id must not be empty"));
        }
        Ok(Response::new(pb::GetByIdResponse { id }))
    }
}

pub struct ProductServiceImpl;

#[tonic::async_trait]
impl pb::product_service_server::ProductService for ProductServiceImpl {
    async fn get_by_id(
        &self,
        request: Request<pb::GetByIdRequest>,
    ) -> Result<Response<pb::GetByIdResponse>, Status> {
        let id = request.into_inner().id;
        if id.is_empty() {
            return Err(Status::invalid_argument("id must not be empty"));
        }
        Ok(Response::new(pb::GetByIdResponse { id }))
    }
}

pub struct DebugServiceImpl;

#[tonic::async_trait]
impl pb::debug_service_server::DebugService for DebugServiceImpl {
    async fn get_by_id(
        &self,
        request: Request<pb::GetByIdRequest>,
    ) -> Result<Response<pb::GetByIdResponse>, Status> {
        let id = request.into_inner().id;
        Ok(Response::new(pb::GetByIdResponse { id }))
    }
}
