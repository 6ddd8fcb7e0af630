//! Declarative macro for operation definitions
//!
//! Generates the request struct, the operation marker type and its
//! [`VieraOperation`](crate::operation::VieraOperation) implementation.
//! Callers provide a `Validate` impl for the generated request and must have
//! `paste::paste` in scope.

/// Define a Viera operation with minimal boilerplate
///
/// # Example
/// ```rust,ignore
/// define_viera_operation! {
///     operation: SetMuteOperation,
///     action: "SetMute",
///     service: RenderingControl,
///     request: {
///         desired_mute: bool,
///     },
///     response: (),
///     payload: |req| format!("<DesiredMute>{}</DesiredMute>", req.desired_mute as u8),
///     parse: |_xml| Ok(()),
/// }
/// ```
#[macro_export]
macro_rules! define_viera_operation {
    (
        operation: $op_struct:ident,
        action: $action:literal,
        service: $service:ident,
        request: {
            $($field:ident: $field_type:ty),* $(,)?
        },
        response: $response_type:ty,
        payload: |$req_param:ident| $payload_expr:expr,
        parse: |$xml_param:ident| $parse_expr:expr $(,)?
    ) => {
        paste! {
            #[derive(Clone, Debug, PartialEq)]
            pub struct [<$op_struct Request>] {
                $(pub $field: $field_type,)*
            }

            #[derive(Debug, Clone, Copy)]
            pub struct $op_struct;

            impl $crate::operation::VieraOperation for $op_struct {
                type Request = [<$op_struct Request>];
                type Response = $response_type;

                const SERVICE: $crate::service::Service = $crate::service::Service::$service;
                const ACTION: &'static str = $action;

                fn build_payload(request: &Self::Request) -> Result<String, $crate::operation::InvalidParameter> {
                    $crate::operation::Validate::validate(request)?;
                    let $req_param = request;
                    Ok($payload_expr)
                }

                fn parse_response(xml: &str) -> Result<Self::Response, $crate::error::ApiError> {
                    let $xml_param = xml;
                    $parse_expr
                }
            }
        }
    };
}
