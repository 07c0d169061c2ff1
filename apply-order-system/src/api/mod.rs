use actix_web::web;
use domain_apply_order::exception::ApplyOrderResult;
use infrastructure_architecture::base_dto::ResponseBase;

pub mod order;
pub mod ticket;

pub type ApiResponse<T> = web::Json<ResponseBase<T>>;

/// Wrap a service result into the response envelope.
fn respond<T>(res: ApplyOrderResult<T>) -> ApiResponse<T> {
    web::Json(match res {
        Ok(content) => ResponseBase::ok(Some(content)),
        Err(e) => {
            if e.status() == 500 {
                tracing::error!("{e:?}");
            } else {
                tracing::warn!(status = e.status(), "{e}");
            }
            ResponseBase::err(e.status() as i32, &e.to_string())
        }
    })
}

#[cfg(test)]
mod tests {
    use domain_apply_order::exception::ApplyOrderException;

    use super::*;

    #[test]
    fn domain_errors_keep_their_code() {
        let res: ApplyOrderResult<u64> = Err(ApplyOrderException::TicketNotFound { order_id: 7 });
        let body = respond(res).into_inner();
        assert_eq!(body.status, 1000);
        assert!(body.content.is_none());
        assert!(body.message.contains('7'), "{}", body.message);

        let body = respond(Ok(7u64)).into_inner();
        assert_eq!(body.status, 200);
        assert_eq!(body.content, Some(7));
    }
}
