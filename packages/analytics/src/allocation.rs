//! Distribution of security staff over ranked hotspots.

use campus_safety_analytics_models::{Hotspot, PersonnelAllocation};

/// Splits `personnel` across `hotspots` in proportion to their risk scores.
///
/// Each hotspot first gets the whole part of its share; the staff left over
/// go one each to the largest remainders, earlier hotspots first on ties.
/// The result keeps the order of `hotspots` and always sums to `personnel`
/// unless there are no hotspots.
#[must_use]
pub fn allocate_personnel(hotspots: &[Hotspot], personnel: u32) -> Vec<PersonnelAllocation> {
    let total_risk: u128 = hotspots.iter().map(|h| u128::from(h.risk_score)).sum();
    if total_risk == 0 {
        return hotspots
            .iter()
            .map(|h| PersonnelAllocation {
                location: h.location.clone(),
                risk_score: h.risk_score,
                personnel: 0,
            })
            .collect();
    }

    let shares: Vec<(u32, u128)> = hotspots
        .iter()
        .map(|h| {
            let weighted = u128::from(personnel) * u128::from(h.risk_score);
            // weighted / total_risk never exceeds personnel
            let whole = u32::try_from(weighted / total_risk).unwrap_or(personnel);
            (whole, weighted % total_risk)
        })
        .collect();

    let mut allocated: Vec<u32> = shares.iter().map(|&(whole, _)| whole).collect();
    let mut left = personnel - allocated.iter().sum::<u32>();

    let mut order: Vec<usize> = (0..shares.len()).collect();
    order.sort_by(|&a, &b| shares[b].1.cmp(&shares[a].1));
    for i in order {
        if left == 0 {
            break;
        }
        allocated[i] += 1;
        left -= 1;
    }

    hotspots
        .iter()
        .zip(allocated)
        .map(|(h, personnel)| PersonnelAllocation {
            location: h.location.clone(),
            risk_score: h.risk_score,
            personnel,
        })
        .collect()
}
