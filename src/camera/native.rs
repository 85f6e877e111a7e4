//! Native camera backend via nokhwa.
//!
//! Only compiled with the `camera` feature. nokhwa's `Camera` is not `Send`
//! on every platform, so each stream gets a dedicated capture thread that
//! owns the device and answers frame requests over a channel. Stopping the
//! stream (or dropping it) stops the device and joins the thread.

use super::{MediaConstraints, MediaDevices, MediaStream};
use crate::error::CameraError;
use async_trait::async_trait;

/// `getUserMedia` backed by the platform camera API.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeDevices;

#[cfg(feature = "camera")]
#[async_trait]
impl MediaDevices for NativeDevices {
    async fn get_user_media(
        &self,
        constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        let constraints = constraints.clone();
        // Opening a device blocks until the OS permission prompt resolves.
        tokio::task::spawn_blocking(move || backend::open(&constraints))
            .await
            .map_err(|e| CameraError::Backend(format!("camera open task failed: {}", e)))?
    }
}

#[cfg(not(feature = "camera"))]
#[async_trait]
impl MediaDevices for NativeDevices {
    async fn get_user_media(
        &self,
        _constraints: &MediaConstraints,
    ) -> Result<Box<dyn MediaStream>, CameraError> {
        Err(CameraError::Backend(
            "built without camera support (rebuild with --features camera)".to_string(),
        ))
    }
}

#[cfg(feature = "camera")]
mod backend {
    use super::super::{select_device, DeviceInfo, MediaConstraints, MediaStream};
    use crate::error::CameraError;
    use image::RgbImage;
    use nokhwa::pixel_format::RgbFormat;
    use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
    use nokhwa::{Camera, NokhwaError};
    use std::sync::mpsc::{self, Receiver, Sender};
    use std::thread::JoinHandle;

    enum Command {
        Frame(Sender<Result<RgbImage, CameraError>>),
        Stop,
    }

    pub struct NativeStream {
        label: String,
        resolution: (u32, u32),
        commands: Sender<Command>,
        worker: Option<JoinHandle<()>>,
    }

    fn map_err(e: NokhwaError) -> CameraError {
        let msg = e.to_string();
        if msg.to_lowercase().contains("permission") {
            CameraError::PermissionDenied(msg)
        } else {
            CameraError::Backend(msg)
        }
    }

    fn list_devices() -> Result<Vec<DeviceInfo>, CameraError> {
        let infos = nokhwa::query(ApiBackend::Auto).map_err(map_err)?;
        Ok(infos
            .iter()
            .enumerate()
            .map(|(pos, info)| DeviceInfo {
                index: match info.index() {
                    CameraIndex::Index(i) => *i,
                    CameraIndex::String(_) => pos as u32,
                },
                name: info.human_name(),
                description: info.description().to_string(),
            })
            .collect())
    }

    pub fn open(constraints: &MediaConstraints) -> Result<Box<dyn MediaStream>, CameraError> {
        let devices = list_devices()?;
        log::info!("[CAMERA] {} device(s) found", devices.len());
        for d in &devices {
            log::debug!("[CAMERA]   #{} {} ({})", d.index, d.name, d.description);
        }

        let index = select_device(&devices, constraints)?;
        let label = devices
            .iter()
            .find(|d| d.index == index)
            .map(|d| d.name.clone())
            .unwrap_or_else(|| format!("camera #{}", index));

        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let worker = std::thread::Builder::new()
            .name("lens-ocr-camera".to_string())
            .spawn(move || capture_loop(index, cmd_rx, ready_tx))
            .map_err(|e| CameraError::Backend(format!("failed to spawn capture thread: {}", e)))?;

        let resolution = ready_rx.recv().map_err(|_| CameraError::StreamClosed)??;

        Ok(Box::new(NativeStream {
            label,
            resolution,
            commands: cmd_tx,
            worker: Some(worker),
        }))
    }

    fn capture_loop(
        index: u32,
        commands: Receiver<Command>,
        ready: Sender<Result<(u32, u32), CameraError>>,
    ) {
        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestResolution);
        let opened = Camera::new(CameraIndex::Index(index), format).and_then(|mut camera| {
            camera.open_stream()?;
            Ok(camera)
        });
        let mut camera = match opened {
            Ok(camera) => camera,
            Err(e) => {
                let _ = ready.send(Err(map_err(e)));
                return;
            }
        };

        let res = camera.resolution();
        let _ = ready.send(Ok((res.width(), res.height())));

        for command in commands {
            match command {
                Command::Frame(reply) => {
                    let _ = reply.send(grab(&mut camera));
                }
                Command::Stop => break,
            }
        }

        if let Err(e) = camera.stop_stream() {
            log::warn!("[CAMERA] stop_stream failed: {}", e);
        }
        log::info!("[CAMERA] Capture thread for #{} exited", index);
    }

    fn grab(camera: &mut Camera) -> Result<RgbImage, CameraError> {
        let buffer = camera.frame().map_err(map_err)?;
        let decoded = buffer.decode_image::<RgbFormat>().map_err(map_err)?;
        let (w, h) = (decoded.width(), decoded.height());
        RgbImage::from_raw(w, h, decoded.into_raw())
            .ok_or_else(|| CameraError::Backend("decoded frame has wrong length".to_string()))
    }

    impl MediaStream for NativeStream {
        fn label(&self) -> &str {
            &self.label
        }

        fn resolution(&self) -> (u32, u32) {
            self.resolution
        }

        fn grab_frame(&mut self) -> Result<RgbImage, CameraError> {
            if self.worker.is_none() {
                return Err(CameraError::StreamClosed);
            }
            let (tx, rx) = mpsc::channel();
            self.commands
                .send(Command::Frame(tx))
                .map_err(|_| CameraError::StreamClosed)?;
            rx.recv().map_err(|_| CameraError::StreamClosed)?
        }

        fn stop(&mut self) {
            if let Some(worker) = self.worker.take() {
                let _ = self.commands.send(Command::Stop);
                if worker.join().is_err() {
                    log::error!("[CAMERA] Capture thread panicked");
                }
            }
        }
    }

    impl Drop for NativeStream {
        fn drop(&mut self) {
            self.stop();
        }
    }
}
