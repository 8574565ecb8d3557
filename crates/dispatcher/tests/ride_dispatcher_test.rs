#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::time::Duration;

    use ridehail_core::DispatchError;
    use ridehail_dispatcher::{FirstAvailableStrategy, RandomSelectionStrategy, RideDispatcher};
    use ridehail_domain::{
        DriverStatus, RideDispatchService, RideRequest, RideRequestStatus, RideStatus,
    };

    const TIMEOUT: Duration = Duration::from_secs(10);

    fn ordered_dispatcher() -> RideDispatcher {
        RideDispatcher::with_strategy(TIMEOUT, Arc::new(FirstAvailableStrategy))
    }

    fn request(rider_id: &str) -> RideRequest {
        RideRequest {
            rider_id: rider_id.to_string(),
            pickup_location: "Central Station".to_string(),
            destination: "Harbour".to_string(),
        }
    }

    async fn register_all(dispatcher: &RideDispatcher, drivers: &[&str]) {
        for driver in drivers {
            dispatcher.register_driver(driver).await.unwrap();
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_ride_lifecycle() {
        let dispatcher = ordered_dispatcher();
        register_all(&dispatcher, &["d1", "d2"]).await;

        let response = dispatcher.request_ride(request("rider-1")).await.unwrap();
        assert_eq!(response.status, RideRequestStatus::Assigned);
        assert_eq!(response.assigned_driver, "d1");
        let ride_id = response.ride_id;

        let offered = dispatcher.assigned_ride("d1").await.unwrap().unwrap();
        assert_eq!(offered.id, ride_id);
        assert_eq!(offered.pickup_location, "Central Station");

        // 其他司机接单失败且状态不变
        let err = dispatcher.accept_ride("d2", &ride_id).await.unwrap_err();
        assert!(matches!(err, DispatchError::WrongDriver { .. }));
        assert_eq!(
            dispatcher.ride_status(&ride_id).await.unwrap(),
            Some(RideStatus::WaitingForAcceptance)
        );

        dispatcher.accept_ride("d1", &ride_id).await.unwrap();
        assert_eq!(
            dispatcher.ride_status(&ride_id).await.unwrap(),
            Some(RideStatus::InProgress)
        );
        assert_eq!(
            dispatcher.drivers().status("d1").unwrap(),
            Some(DriverStatus::Busy)
        );

        // 接单后计时器不再生效
        tokio::time::sleep(TIMEOUT * 3).await;
        assert_eq!(
            dispatcher.ride_status(&ride_id).await.unwrap(),
            Some(RideStatus::InProgress)
        );

        dispatcher.complete_ride("d1", &ride_id).await.unwrap();
        assert_eq!(
            dispatcher.ride_status(&ride_id).await.unwrap(),
            Some(RideStatus::Completed)
        );
        assert_eq!(
            dispatcher.drivers().status("d1").unwrap(),
            Some(DriverStatus::Available)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unanswered_ride_is_reassigned_until_cancelled() {
        let dispatcher = ordered_dispatcher();
        register_all(&dispatcher, &["d1", "d2"]).await;

        let ride_id = dispatcher
            .request_ride(request("rider-1"))
            .await
            .unwrap()
            .ride_id;

        tokio::time::sleep(TIMEOUT + Duration::from_secs(1)).await;
        let ride = dispatcher.rides().get(&ride_id).unwrap().unwrap();
        assert_eq!(ride.status, RideStatus::WaitingForAcceptance);
        assert_eq!(ride.assigned_driver.as_deref(), Some("d2"));
        assert!(ride.has_rejected("d1"));
        assert!(dispatcher.assigned_ride("d1").await.unwrap().is_none());
        assert!(dispatcher.assigned_ride("d2").await.unwrap().is_some());

        tokio::time::sleep(TIMEOUT).await;
        let ride = dispatcher.rides().get(&ride_id).unwrap().unwrap();
        assert_eq!(ride.status, RideStatus::Cancelled);
        assert!(ride.assigned_driver.is_none());

        // 取消后不再有任何计时
        tokio::time::sleep(TIMEOUT * 3).await;
        assert_eq!(
            dispatcher.ride_status(&ride_id).await.unwrap(),
            Some(RideStatus::Cancelled)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_then_status() {
        let dispatcher = ordered_dispatcher();
        register_all(&dispatcher, &["d1", "d2"]).await;

        let ride_id = dispatcher
            .request_ride(request("rider-1"))
            .await
            .unwrap()
            .ride_id;

        dispatcher.reject_ride("d1", &ride_id).await.unwrap();
        assert_eq!(
            dispatcher.ride_status(&ride_id).await.unwrap(),
            Some(RideStatus::WaitingForAcceptance)
        );

        // 拒单的司机不能再操作该行程
        let err = dispatcher.reject_ride("d1", &ride_id).await.unwrap_err();
        assert!(matches!(err, DispatchError::WrongDriver { .. }));

        dispatcher.reject_ride("d2", &ride_id).await.unwrap();
        assert_eq!(
            dispatcher.ride_status(&ride_id).await.unwrap(),
            Some(RideStatus::Cancelled)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_restarts_the_deadline() {
        let dispatcher = ordered_dispatcher();
        register_all(&dispatcher, &["d1", "d2", "d3"]).await;

        let ride_id = dispatcher
            .request_ride(request("rider-1"))
            .await
            .unwrap()
            .ride_id;

        tokio::time::sleep(Duration::from_secs(8)).await;
        dispatcher.reject_ride("d1", &ride_id).await.unwrap();

        // 新司机从拒单时刻起有完整的时限
        tokio::time::sleep(Duration::from_secs(8)).await;
        let ride = dispatcher.rides().get(&ride_id).unwrap().unwrap();
        assert_eq!(ride.assigned_driver.as_deref(), Some("d2"));

        tokio::time::sleep(Duration::from_secs(3)).await;
        let ride = dispatcher.rides().get(&ride_id).unwrap().unwrap();
        assert_eq!(ride.assigned_driver.as_deref(), Some("d3"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregistered_driver_keeps_pending_ride_until_timeout() {
        let dispatcher = ordered_dispatcher();
        register_all(&dispatcher, &["d1", "d2"]).await;

        let ride_id = dispatcher
            .request_ride(request("rider-1"))
            .await
            .unwrap()
            .ride_id;

        dispatcher.unregister_driver("d1").await.unwrap();
        let ride = dispatcher.rides().get(&ride_id).unwrap().unwrap();
        assert_eq!(ride.status, RideStatus::WaitingForAcceptance);
        assert_eq!(ride.assigned_driver.as_deref(), Some("d1"));

        tokio::time::sleep(TIMEOUT + Duration::from_secs(1)).await;
        let ride = dispatcher.rides().get(&ride_id).unwrap().unwrap();
        assert_eq!(ride.assigned_driver.as_deref(), Some("d2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_drivers_available() {
        let dispatcher = ordered_dispatcher();

        let response = dispatcher.request_ride(request("rider-1")).await.unwrap();
        assert_eq!(response.status, RideRequestStatus::NoDriversAvailable);
        assert!(response.ride_id.is_empty());

        // 司机上线后也不会自动重试旧请求
        register_all(&dispatcher, &["d1"]).await;
        tokio::time::sleep(TIMEOUT * 2).await;
        assert!(dispatcher.assigned_ride("d1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_ride_queries() {
        let dispatcher = ordered_dispatcher();
        register_all(&dispatcher, &["d1"]).await;

        assert_eq!(dispatcher.ride_status("missing").await.unwrap(), None);
        assert!(matches!(
            dispatcher.accept_ride("d1", "missing").await.unwrap_err(),
            DispatchError::RideNotFound { .. }
        ));
        assert!(matches!(
            dispatcher.complete_ride("d1", "missing").await.unwrap_err(),
            DispatchError::RideNotFound { .. }
        ));
        assert!(dispatcher.assigned_ride("ghost").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_abandons_deadlines() {
        let dispatcher = ordered_dispatcher();
        register_all(&dispatcher, &["d1", "d2"]).await;

        let ride_id = dispatcher
            .request_ride(request("rider-1"))
            .await
            .unwrap()
            .ride_id;

        dispatcher.shutdown().unwrap();
        tokio::time::sleep(TIMEOUT * 3).await;

        let ride = dispatcher.rides().get(&ride_id).unwrap().unwrap();
        assert_eq!(ride.status, RideStatus::WaitingForAcceptance);
        assert_eq!(ride.assigned_driver.as_deref(), Some("d1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_requests_after_shutdown_start_no_deadlines() {
        let dispatcher = ordered_dispatcher();
        register_all(&dispatcher, &["d1", "d2"]).await;
        dispatcher.shutdown().unwrap();

        // 排空期间仍可处理请求，但不再启动接单计时
        let response = dispatcher.request_ride(request("rider-1")).await.unwrap();
        assert_eq!(response.status, RideRequestStatus::Assigned);
        assert_eq!(response.assigned_driver, "d1");
        let ride_id = response.ride_id;

        tokio::time::sleep(TIMEOUT * 3).await;
        let ride = dispatcher.rides().get(&ride_id).unwrap().unwrap();
        assert_eq!(ride.assigned_driver.as_deref(), Some("d1"));

        dispatcher.reject_ride("d1", &ride_id).await.unwrap();
        tokio::time::sleep(TIMEOUT * 3).await;
        let ride = dispatcher.rides().get(&ride_id).unwrap().unwrap();
        assert_eq!(ride.status, RideStatus::WaitingForAcceptance);
        assert_eq!(ride.assigned_driver.as_deref(), Some("d2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_random_assignment_uses_both_drivers() {
        let mut seen = HashSet::new();
        for seed in 0..32 {
            let dispatcher =
                RideDispatcher::with_strategy(TIMEOUT, Arc::new(RandomSelectionStrategy::with_seed(seed)));
            register_all(&dispatcher, &["d1", "d2"]).await;
            let response = dispatcher.request_ride(request("rider-1")).await.unwrap();
            seen.insert(response.assigned_driver);
        }
        assert_eq!(seen.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_requests_never_double_book_a_driver() {
        let dispatcher = Arc::new(RideDispatcher::new(Duration::from_secs(60)));
        let drivers: Vec<String> = (0..20).map(|i| format!("driver-{i}")).collect();
        for driver in &drivers {
            dispatcher.register_driver(driver).await.unwrap();
        }

        let mut handles = Vec::new();
        for i in 0..50 {
            let dispatcher = Arc::clone(&dispatcher);
            handles.push(tokio::spawn(async move {
                dispatcher
                    .request_ride(request(&format!("rider-{i}")))
                    .await
                    .unwrap()
            }));
        }

        let mut assigned = Vec::new();
        for handle in handles {
            let response = handle.await.unwrap();
            if response.status == RideRequestStatus::Assigned {
                assigned.push(response.assigned_driver);
            }
        }

        let unique: HashSet<_> = assigned.iter().cloned().collect();
        assert_eq!(assigned.len(), drivers.len());
        assert_eq!(unique.len(), drivers.len());

        dispatcher.shutdown().unwrap();
    }
}
