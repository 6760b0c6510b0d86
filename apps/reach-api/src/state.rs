use std::sync::Arc;

use reach_service::ReachService;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<ReachService>,
}
impl AppState {
	pub async fn new(config: reach_config::Config) -> color_eyre::Result<Self> {
		let service = ReachService::from_config(config).await?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: ReachService) -> Self {
		Self { service: Arc::new(service) }
	}
}
