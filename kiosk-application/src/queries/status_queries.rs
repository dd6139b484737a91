use kiosk_domain::DeviceStatus;

use crate::AppState;

pub async fn device_status(state: &AppState) -> DeviceStatus {
    DeviceStatus {
        arduino_connected: state.scale.is_some(),
        camera_available: state.camera.probe().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestRig;

    #[tokio::test]
    async fn reports_missing_board_and_camera() {
        let rig = TestRig::new().without_scale().camera_unavailable();
        let status = device_status(&rig.state()).await;
        assert!(!status.arduino_connected);
        assert!(!status.camera_available);
    }

    #[tokio::test]
    async fn reports_connected_devices() {
        let rig = TestRig::new();
        let status = device_status(&rig.state()).await;
        assert!(status.arduino_connected);
        assert!(status.camera_available);
    }
}
