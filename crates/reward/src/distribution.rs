//! Splitting an amount across the outputs of a transaction.

use rabbits_primitives::{Amount, ScanOutput};

/// Amount assigned to one output.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct OutputShare {
    pub vout: u32,
    pub amount: Amount,
}

/// Splits `total` across `outputs`.
///
/// OP_RETURN outputs never receive anything. A lone spendable output takes
/// everything. Otherwise the last spendable output is left out and the rest
/// are paid `floor(total * value / sum)` each, with the remainder going to the
/// first of them; if their values sum to zero the first takes everything.
///
/// The shares always sum to `total`, except when there is no spendable output,
/// in which case the result is empty.
pub fn distribute(total: Amount, outputs: &[ScanOutput]) -> Vec<OutputShare> {
    let spendable: Vec<&ScanOutput> = outputs.iter().filter(|out| out.is_spendable()).collect();

    let included = match spendable.len() {
        0 => return Vec::new(),
        1 => {
            return vec![OutputShare {
                vout: spendable[0].vout,
                amount: total,
            }]
        }
        n => &spendable[..n - 1],
    };

    let value_sum: u128 = included.iter().map(|out| out.value as u128).sum();
    let mut shares: Vec<OutputShare> = included
        .iter()
        .map(|out| OutputShare {
            vout: out.vout,
            amount: 0,
        })
        .collect();

    if value_sum == 0 {
        shares[0].amount = total;
        return shares;
    }

    let mut distributed: Amount = 0;
    for (share, out) in shares.iter_mut().zip(included) {
        // value <= value_sum, so the quotient never exceeds total
        share.amount = (total as u128 * out.value as u128 / value_sum) as Amount;
        distributed += share.amount;
    }
    shares[0].amount += total - distributed;

    shares
}
