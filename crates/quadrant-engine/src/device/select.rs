//! Adapter selection.
//!
//! Adapters are walked in the order the platform enumerates them. Software
//! rasterizers are never picked, even when they are the only candidate that
//! meets the requested capability level.

/// Minimum capability an adapter has to expose to be selected.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum CapabilityLevel {
    /// Downlevel limits; enough for a fixed vertex-colored pipeline.
    #[default]
    Downlevel,
    /// Full WebGPU limits and downlevel flags.
    WebGpu,
}

impl CapabilityLevel {
    /// Limits requested from the device for this level.
    pub fn limits(self) -> wgpu::Limits {
        match self {
            Self::Downlevel => wgpu::Limits::downlevel_defaults(),
            Self::WebGpu => wgpu::Limits::default(),
        }
    }
}

/// Read-only description of an enumerated adapter.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AdapterSummary {
    pub name: String,
    pub backend: wgpu::Backend,
    pub software: bool,
}

/// Capability probe over an enumerated adapter.
///
/// Probing must not create a device.
pub trait AdapterProbe {
    fn summary(&self) -> AdapterSummary;

    fn supports(&self, level: CapabilityLevel) -> bool;
}

impl AdapterProbe for wgpu::Adapter {
    fn summary(&self) -> AdapterSummary {
        let info = self.get_info();
        AdapterSummary {
            name: info.name,
            backend: info.backend,
            software: info.device_type == wgpu::DeviceType::Cpu,
        }
    }

    fn supports(&self, level: CapabilityLevel) -> bool {
        if !level.limits().check_limits(&self.limits()) {
            return false;
        }
        match level {
            CapabilityLevel::Downlevel => true,
            CapabilityLevel::WebGpu => self.get_downlevel_capabilities().is_webgpu_compliant(),
        }
    }
}

/// Returns the first hardware adapter meeting `level`, in enumeration order.
///
/// `None` means no adapter qualifies; callers treat that as a fatal startup
/// failure.
pub fn select_adapter<A, I>(candidates: I, level: CapabilityLevel) -> Option<A>
where
    A: AdapterProbe,
    I: IntoIterator<Item = A>,
{
    for (index, candidate) in candidates.into_iter().enumerate() {
        let summary = candidate.summary();

        if summary.software {
            log::debug!("adapter #{index} \"{}\" skipped: software", summary.name);
            continue;
        }

        if !candidate.supports(level) {
            log::debug!(
                "adapter #{index} \"{}\" ({:?}) skipped: below {level:?}",
                summary.name,
                summary.backend
            );
            continue;
        }

        log::debug!("adapter #{index} \"{}\" qualifies", summary.name);
        return Some(candidate);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    struct FakeAdapter {
        name: &'static str,
        software: bool,
        level: Option<CapabilityLevel>,
    }

    impl FakeAdapter {
        fn hardware(name: &'static str, level: CapabilityLevel) -> Self {
            Self { name, software: false, level: Some(level) }
        }

        fn software(name: &'static str) -> Self {
            Self { name, software: true, level: Some(CapabilityLevel::WebGpu) }
        }

        fn unsupported(name: &'static str) -> Self {
            Self { name, software: false, level: None }
        }
    }

    impl AdapterProbe for FakeAdapter {
        fn summary(&self) -> AdapterSummary {
            AdapterSummary {
                name: self.name.to_string(),
                backend: wgpu::Backend::Noop,
                software: self.software,
            }
        }

        fn supports(&self, level: CapabilityLevel) -> bool {
            match (self.level, level) {
                (None, _) => false,
                (Some(CapabilityLevel::WebGpu), _) => true,
                (Some(CapabilityLevel::Downlevel), wanted) => wanted == CapabilityLevel::Downlevel,
            }
        }
    }

    #[test]
    fn software_adapter_enumerated_first_is_skipped() {
        let picked = select_adapter(
            [
                FakeAdapter::software("warp"),
                FakeAdapter::hardware("discrete", CapabilityLevel::Downlevel),
            ],
            CapabilityLevel::Downlevel,
        );
        assert_eq!(picked.map(|a| a.name), Some("discrete"));
    }

    #[test]
    fn software_adapter_enumerated_last_is_skipped() {
        let picked = select_adapter(
            [
                FakeAdapter::hardware("discrete", CapabilityLevel::Downlevel),
                FakeAdapter::software("warp"),
            ],
            CapabilityLevel::Downlevel,
        );
        assert_eq!(picked.map(|a| a.name), Some("discrete"));
    }

    #[test]
    fn first_qualifying_adapter_wins() {
        let picked = select_adapter(
            [
                FakeAdapter::unsupported("ancient"),
                FakeAdapter::hardware("integrated", CapabilityLevel::WebGpu),
                FakeAdapter::hardware("discrete", CapabilityLevel::WebGpu),
            ],
            CapabilityLevel::Downlevel,
        );
        assert_eq!(picked.map(|a| a.name), Some("integrated"));
    }

    #[test]
    fn adapter_below_requested_level_is_skipped() {
        let picked = select_adapter(
            [
                FakeAdapter::hardware("integrated", CapabilityLevel::Downlevel),
                FakeAdapter::hardware("discrete", CapabilityLevel::WebGpu),
            ],
            CapabilityLevel::WebGpu,
        );
        assert_eq!(picked.map(|a| a.name), Some("discrete"));
    }

    #[test]
    fn only_software_adapters_yields_none() {
        let picked = select_adapter(
            [FakeAdapter::software("warp"), FakeAdapter::software("llvmpipe")],
            CapabilityLevel::Downlevel,
        );
        assert!(picked.is_none());
    }

    #[test]
    fn empty_enumeration_yields_none() {
        let picked = select_adapter(Vec::<FakeAdapter>::new(), CapabilityLevel::Downlevel);
        assert!(picked.is_none());
    }
}
