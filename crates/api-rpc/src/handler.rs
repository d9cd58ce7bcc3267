//! RPC Method Handlers
//!
//! Thin adapters from JSON-RPC parameters to QueueRegistry operations.

use crate::error::to_rpc_error;
use crate::types::{
    ClearResponse, CreateRequest, CreateResponse, DeleteResponse, DequeueResponse,
    EnqueueRequest, EnqueueResponse, FlushRequest, FlushResponse, ListRequest, ListResponse,
    PeekResponse, QueueRef, SaveResponse, SearchRequest, SearchResponse, ShowRequest,
    ShowResponse,
};
use jsonrpsee::types::ErrorObjectOwned;
use queuekeeper_core::application::QueueRegistry;
use std::sync::Arc;

type RpcResult<T> = Result<T, ErrorObjectOwned>;

/// RPC Handler with injected registry
pub struct RpcHandler {
    registry: Arc<QueueRegistry>,
}

impl RpcHandler {
    pub fn new(registry: Arc<QueueRegistry>) -> Self {
        Self { registry }
    }

    /// queue.create.v1
    pub async fn create(&self, params: CreateRequest) -> RpcResult<CreateResponse> {
        let queue = self
            .registry
            .create_queue(&params.queue, params.max_size)
            .await
            .map_err(to_rpc_error)?;
        Ok(CreateResponse { queue })
    }

    /// queue.delete.v1
    pub async fn delete(&self, params: QueueRef) -> RpcResult<DeleteResponse> {
        let outcome = self
            .registry
            .delete_queue(&params.queue)
            .await
            .map_err(to_rpc_error)?;
        Ok(DeleteResponse {
            queue: outcome.name,
            deleted: true,
            warning: outcome.store_warning,
        })
    }

    /// queue.enqueue.v1
    pub async fn enqueue(&self, params: EnqueueRequest) -> RpcResult<EnqueueResponse> {
        let size = self
            .registry
            .enqueue(&params.queue, &params.item)
            .await
            .map_err(to_rpc_error)?;
        Ok(EnqueueResponse {
            queue: params.queue,
            size,
        })
    }

    /// queue.dequeue.v1
    pub async fn dequeue(&self, params: QueueRef) -> RpcResult<DequeueResponse> {
        let outcome = self
            .registry
            .dequeue(&params.queue)
            .await
            .map_err(to_rpc_error)?;
        Ok(DequeueResponse {
            queue: params.queue,
            item: outcome.item,
            size: outcome.size,
        })
    }

    /// queue.front.v1
    pub async fn front(&self, params: QueueRef) -> RpcResult<PeekResponse> {
        let item = self
            .registry
            .front(&params.queue)
            .await
            .map_err(to_rpc_error)?;
        Ok(PeekResponse {
            queue: params.queue,
            item,
        })
    }

    /// queue.rear.v1
    pub async fn rear(&self, params: QueueRef) -> RpcResult<PeekResponse> {
        let item = self
            .registry
            .rear(&params.queue)
            .await
            .map_err(to_rpc_error)?;
        Ok(PeekResponse {
            queue: params.queue,
            item,
        })
    }

    /// queue.search.v1
    pub async fn search(&self, params: SearchRequest) -> RpcResult<SearchResponse> {
        let index = self
            .registry
            .search(&params.queue, &params.item)
            .await
            .map_err(to_rpc_error)?;
        Ok(SearchResponse {
            queue: params.queue,
            item: params.item,
            index,
        })
    }

    /// queue.clear.v1
    pub async fn clear(&self, params: QueueRef) -> RpcResult<ClearResponse> {
        let removed = self
            .registry
            .clear(&params.queue)
            .await
            .map_err(to_rpc_error)?;
        Ok(ClearResponse {
            queue: params.queue,
            removed,
        })
    }

    /// queue.show.v1
    pub async fn show(&self, params: ShowRequest) -> RpcResult<ShowResponse> {
        let details = self
            .registry
            .describe(&params.queue, params.log_limit)
            .await
            .map_err(to_rpc_error)?;
        Ok(ShowResponse { details })
    }

    /// queue.list.v1
    pub async fn list(&self, _params: ListRequest) -> RpcResult<ListResponse> {
        Ok(ListResponse {
            queues: self.registry.list_queues().await,
        })
    }

    /// queue.save.v1
    pub async fn save(&self, params: QueueRef) -> RpcResult<SaveResponse> {
        self.registry
            .save_queue(&params.queue)
            .await
            .map_err(to_rpc_error)?;
        Ok(SaveResponse {
            queue: params.queue,
            saved: true,
        })
    }

    /// admin.flush.v1
    pub async fn flush(&self, _params: FlushRequest) -> RpcResult<FlushResponse> {
        Ok(FlushResponse {
            report: self.registry.flush_all().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::code;
    use queuekeeper_core::application::AuditSink;
    use queuekeeper_core::port::queue_store::mocks::InMemoryQueueStore;
    use queuekeeper_core::port::time_provider::SystemTimeProvider;

    fn setup() -> (Arc<InMemoryQueueStore>, RpcHandler) {
        let store = Arc::new(InMemoryQueueStore::new());
        let registry = Arc::new(QueueRegistry::new(
            store.clone(),
            Arc::new(SystemTimeProvider),
            AuditSink::disabled(),
        ));
        (store, RpcHandler::new(registry))
    }

    fn queue_ref(name: &str) -> QueueRef {
        QueueRef {
            queue: name.to_string(),
        }
    }

    async fn enqueue(handler: &RpcHandler, item: &str) -> RpcResult<EnqueueResponse> {
        handler
            .enqueue(EnqueueRequest {
                queue: "orders".to_string(),
                item: item.to_string(),
            })
            .await
    }

    #[tokio::test]
    async fn test_orders_over_rpc() {
        let (_, handler) = setup();
        handler
            .create(CreateRequest {
                queue: "orders".to_string(),
                max_size: Some(2),
            })
            .await
            .unwrap();

        assert_eq!(enqueue(&handler, "a").await.unwrap().size, 1);
        assert_eq!(enqueue(&handler, "b").await.unwrap().size, 2);
        let err = enqueue(&handler, "c").await.unwrap_err();
        assert_eq!(err.code(), code::CAPACITY_EXCEEDED);

        let dequeued = handler.dequeue(queue_ref("orders")).await.unwrap();
        assert_eq!(dequeued.item, "a");
        assert_eq!(dequeued.size, 1);

        let found = handler
            .search(SearchRequest {
                queue: "orders".to_string(),
                item: "b".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(found.index, Some(0));
    }

    #[tokio::test]
    async fn test_error_codes() {
        let (_, handler) = setup();
        let err = handler.front(queue_ref("ghost")).await.unwrap_err();
        assert_eq!(err.code(), code::UNKNOWN_QUEUE);

        handler
            .create(CreateRequest {
                queue: "orders".to_string(),
                max_size: None,
            })
            .await
            .unwrap();
        let err = handler.rear(queue_ref("orders")).await.unwrap_err();
        assert_eq!(err.code(), code::EMPTY_QUEUE);

        let err = handler
            .create(CreateRequest {
                queue: "orders".to_string(),
                max_size: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), code::DUPLICATE_NAME);
    }

    #[tokio::test]
    async fn test_delete_reports_store_warning() {
        let (store, handler) = setup();
        handler
            .create(CreateRequest {
                queue: "orders".to_string(),
                max_size: None,
            })
            .await
            .unwrap();
        store.set_unavailable(true);

        let response = handler.delete(queue_ref("orders")).await.unwrap();
        assert!(response.deleted);
        assert!(response.warning.is_some());

        let err = handler.save(queue_ref("orders")).await.unwrap_err();
        assert_eq!(err.code(), code::UNKNOWN_QUEUE);
    }

    #[tokio::test]
    async fn test_flush_and_show() {
        let (store, handler) = setup();
        handler
            .create(CreateRequest {
                queue: "orders".to_string(),
                max_size: None,
            })
            .await
            .unwrap();
        enqueue(&handler, "a").await.unwrap();

        let report = handler.flush(FlushRequest {}).await.unwrap().report;
        assert_eq!(report.saved, 1);
        assert!(store.row("orders").is_some());

        let shown = handler
            .show(ShowRequest {
                queue: "orders".to_string(),
                log_limit: None,
            })
            .await
            .unwrap();
        assert_eq!(shown.details.items, vec!["a"]);

        let listed = handler.list(ListRequest {}).await.unwrap();
        assert_eq!(listed.queues.len(), 1);
    }
}
