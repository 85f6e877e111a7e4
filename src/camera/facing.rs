//! Facing-mode detection for camera devices.
//!
//! Desktop camera APIs don't report which way a camera points, so facing is
//! inferred from the device name and description the driver exposes.

use super::{DeviceInfo, FacingMode, MediaConstraints};
use crate::error::CameraError;
use regex::Regex;
use std::sync::OnceLock;

fn rear_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(back|rear|environment|world)\b").expect("valid rear-camera regex")
    })
}

fn front_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\b(front|user|facetime|selfie)\b").expect("valid front-camera regex")
    })
}

/// Best guess at which way a device points. `None` when the name says nothing.
pub fn detect_facing(device: &DeviceInfo) -> Option<FacingMode> {
    let haystack = format!("{} {}", device.name, device.description);
    if rear_pattern().is_match(&haystack) {
        Some(FacingMode::Environment)
    } else if front_pattern().is_match(&haystack) {
        Some(FacingMode::User)
    } else {
        None
    }
}

/// Pick the device index satisfying `constraints`.
///
/// An explicit `device_index` wins outright (it must exist). Otherwise the
/// first device detected as facing the requested way is chosen; with
/// `exact == false` the first device is used when none matches.
pub fn select_device(
    devices: &[DeviceInfo],
    constraints: &MediaConstraints,
) -> Result<u32, CameraError> {
    if devices.is_empty() {
        return Err(CameraError::NoMatchingDevice("no cameras found".to_string()));
    }

    if let Some(index) = constraints.device_index {
        return devices
            .iter()
            .find(|d| d.index == index)
            .map(|d| d.index)
            .ok_or_else(|| CameraError::NoMatchingDevice(format!("no camera at index {}", index)));
    }

    if let Some(device) = devices
        .iter()
        .find(|d| detect_facing(d) == Some(constraints.facing))
    {
        return Ok(device.index);
    }

    if constraints.exact {
        return Err(CameraError::NoMatchingDevice(format!(
            "facingMode exact {:?} among {} device(s)",
            constraints.facing,
            devices.len()
        )));
    }

    log::warn!(
        "[CAMERA] No {:?}-facing camera detected, falling back to '{}'",
        constraints.facing,
        devices[0].name
    );
    Ok(devices[0].index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dev(index: u32, name: &str) -> DeviceInfo {
        DeviceInfo {
            index,
            name: name.to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn detects_rear_and_front_names() {
        assert_eq!(detect_facing(&dev(0, "Back Camera")), Some(FacingMode::Environment));
        assert_eq!(detect_facing(&dev(0, "REAR camera (ov5640)")), Some(FacingMode::Environment));
        assert_eq!(detect_facing(&dev(0, "FaceTime HD Camera")), Some(FacingMode::User));
        assert_eq!(detect_facing(&dev(0, "Integrated Webcam")), None);
    }

    #[test]
    fn description_counts_too() {
        let d = DeviceInfo {
            index: 3,
            name: "ov8858".to_string(),
            description: "world-facing sensor".to_string(),
        };
        assert_eq!(detect_facing(&d), Some(FacingMode::Environment));
    }

    #[test]
    fn exact_environment_picks_rear_device() {
        let devices = vec![dev(0, "Front Camera"), dev(1, "Back Camera")];
        let idx = select_device(&devices, &MediaConstraints::rear_exact()).unwrap();
        assert_eq!(idx, 1);
    }

    #[test]
    fn exact_environment_fails_without_rear_device() {
        let devices = vec![dev(0, "Integrated Webcam"), dev(1, "Front Camera")];
        let err = select_device(&devices, &MediaConstraints::rear_exact()).unwrap_err();
        assert!(matches!(err, CameraError::NoMatchingDevice(_)));
    }

    #[test]
    fn loose_constraint_falls_back_to_first() {
        let devices = vec![dev(4, "Integrated Webcam")];
        let constraints = MediaConstraints {
            exact: false,
            ..MediaConstraints::rear_exact()
        };
        assert_eq!(select_device(&devices, &constraints).unwrap(), 4);
    }

    #[test]
    fn pinned_index_bypasses_detection() {
        let devices = vec![dev(0, "Front Camera"), dev(2, "Integrated Webcam")];
        let constraints = MediaConstraints {
            device_index: Some(2),
            ..MediaConstraints::rear_exact()
        };
        assert_eq!(select_device(&devices, &constraints).unwrap(), 2);

        let missing = MediaConstraints {
            device_index: Some(9),
            ..MediaConstraints::rear_exact()
        };
        assert!(select_device(&devices, &missing).is_err());
    }

    #[test]
    fn no_devices_is_an_error() {
        assert!(select_device(&[], &MediaConstraints::rear_exact()).is_err());
    }
}
