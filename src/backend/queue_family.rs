// Queue family resolution
//
// Maps raw queue family properties onto the four roles the renderer cares
// about. The scan is a single pass in family-index order where a later
// matching family overwrites an earlier one, so the highest-indexed family
// with a capability ends up assigned. Callers depend on that overwrite
// behavior; do not replace it with a first-match scan.

use ash::vk;
use std::collections::BTreeSet;

use super::error::{BootstrapError, QueueRole};

/// Resolved queue family index per role. Any role may be absent on a given
/// device; graphics and present are validated separately because they are
/// mandatory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub transfer: Option<u32>,
    pub compute: Option<u32>,
    pub present: Option<u32>,
}

/// Scan the queue families of a device and assign roles.
///
/// `supports_present` is queried per family against the target surface and
/// may fail if the driver call does; capability flags are read directly
/// from the properties. A single family can satisfy several roles at once.
pub fn resolve<F>(
    families: &[vk::QueueFamilyProperties],
    mut supports_present: F,
) -> Result<QueueFamilyIndices, BootstrapError>
where
    F: FnMut(u32) -> Result<bool, BootstrapError>,
{
    let mut indices = QueueFamilyIndices::default();
    for (index, family) in families.iter().enumerate() {
        let index = index as u32;

        if family.queue_flags.contains(vk::QueueFlags::GRAPHICS) {
            indices.graphics = Some(index);
        }
        if family.queue_flags.contains(vk::QueueFlags::TRANSFER) {
            indices.transfer = Some(index);
        }
        if family.queue_flags.contains(vk::QueueFlags::COMPUTE) {
            indices.compute = Some(index);
        }
        if supports_present(index)? {
            indices.present = Some(index);
        }
    }
    Ok(indices)
}

impl QueueFamilyIndices {
    /// Check the two mandatory roles and return their family indices as
    /// `(graphics, present)`. Absence of either is fatal.
    pub fn require_mandatory(&self) -> Result<(u32, u32), BootstrapError> {
        let graphics = self.graphics.ok_or(BootstrapError::IncompleteQueueSupport {
            role: QueueRole::Graphics,
        })?;
        let present = self.present.ok_or(BootstrapError::IncompleteQueueSupport {
            role: QueueRole::Present,
        })?;
        Ok((graphics, present))
    }

    /// Advisory roles the device lacks. Their absence degrades capability
    /// but never fails bootstrap.
    pub fn missing_optional_roles(&self) -> Vec<QueueRole> {
        let mut missing = Vec::new();
        if self.transfer.is_none() {
            missing.push(QueueRole::Transfer);
        }
        if self.compute.is_none() {
            missing.push(QueueRole::Compute);
        }
        missing
    }

    /// Log a warning for each advisory role the device lacks. Downstream
    /// code tolerates the absent queues.
    pub fn warn_missing_optional(&self) {
        for role in self.missing_optional_roles() {
            log::warn!("Selected device has no {role} queue family");
        }
    }

    /// De-duplicated set of family indices to request when creating the
    /// logical device. Each distinct family is requested once no matter
    /// how many roles it satisfies.
    pub fn queue_plan(&self) -> BTreeSet<u32> {
        [self.graphics, self.transfer, self.compute, self.present]
            .into_iter()
            .flatten()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn later_family_overwrites_earlier_match() {
        // Family 0 supports graphics (and present below), family 2 supports
        // graphics only; the resolved graphics index must be 2.
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::GRAPHICS),
        ];

        let indices = resolve(&families, |index| Ok(index == 0)).unwrap();
        assert_eq!(indices.graphics, Some(2));
        assert_eq!(indices.transfer, Some(1));
        assert_eq!(indices.present, Some(0));
        assert_eq!(indices.compute, None);
    }

    #[test]
    fn single_family_can_fill_every_role() {
        let families = [family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::TRANSFER | vk::QueueFlags::COMPUTE,
        )];

        let indices = resolve(&families, |_| Ok(true)).unwrap();
        assert_eq!(
            indices,
            QueueFamilyIndices {
                graphics: Some(0),
                transfer: Some(0),
                compute: Some(0),
                present: Some(0),
            }
        );
    }

    #[test]
    fn present_predicate_error_propagates() {
        let families = [family(vk::QueueFlags::GRAPHICS)];
        let result = resolve(&families, |_| {
            Err(BootstrapError::Query(vk::Result::ERROR_SURFACE_LOST_KHR))
        });
        assert!(matches!(result, Err(BootstrapError::Query(_))));
    }

    #[test]
    fn missing_graphics_is_fatal() {
        let indices = QueueFamilyIndices {
            present: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            indices.require_mandatory(),
            Err(BootstrapError::IncompleteQueueSupport {
                role: QueueRole::Graphics
            })
        ));
    }

    #[test]
    fn missing_present_is_fatal() {
        let indices = QueueFamilyIndices {
            graphics: Some(1),
            transfer: Some(1),
            compute: Some(1),
            ..Default::default()
        };
        assert!(matches!(
            indices.require_mandatory(),
            Err(BootstrapError::IncompleteQueueSupport {
                role: QueueRole::Present
            })
        ));
    }

    #[test]
    fn absent_advisory_roles_are_reported_not_fatal() {
        let indices = QueueFamilyIndices {
            graphics: Some(0),
            present: Some(0),
            ..Default::default()
        };
        assert_eq!(
            indices.missing_optional_roles(),
            vec![QueueRole::Transfer, QueueRole::Compute]
        );
        assert!(indices.require_mandatory().is_ok());

        let full = QueueFamilyIndices {
            graphics: Some(0),
            transfer: Some(1),
            compute: Some(1),
            present: Some(0),
        };
        assert!(full.missing_optional_roles().is_empty());
    }

    #[test]
    fn queue_plan_deduplicates_families() {
        let indices = QueueFamilyIndices {
            graphics: Some(2),
            transfer: Some(1),
            compute: Some(2),
            present: Some(0),
        };
        let plan: Vec<u32> = indices.queue_plan().into_iter().collect();
        assert_eq!(plan, vec![0, 1, 2]);
    }

    #[test]
    fn queue_plan_skips_absent_roles() {
        let indices = QueueFamilyIndices {
            graphics: Some(0),
            present: Some(0),
            ..Default::default()
        };
        let plan: Vec<u32> = indices.queue_plan().into_iter().collect();
        assert_eq!(plan, vec![0]);
    }
}
