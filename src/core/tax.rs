use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// A marginal rate applying to income above `threshold`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaxSlab {
    pub threshold: Decimal,
    pub rate: Decimal,
}

/// Progressive slabs, highest first. Income up to 7L is untaxed.
pub const SLABS: [TaxSlab; 4] = [
    TaxSlab {
        threshold: dec!(1500000),
        rate: dec!(0.30),
    },
    TaxSlab {
        threshold: dec!(1200000),
        rate: dec!(0.20),
    },
    TaxSlab {
        threshold: dec!(1000000),
        rate: dec!(0.15),
    },
    TaxSlab {
        threshold: dec!(700000),
        rate: dec!(0.10),
    },
];

/// Income tax liability. Peels the highest applicable slab, taxes the excess
/// at that slab's rate, caps income at the threshold and continues downward.
pub fn calculate_tax(income: Option<Decimal>) -> Decimal {
    let Some(mut income) = income else {
        return Decimal::ZERO;
    };

    let mut tax = Decimal::ZERO;
    for slab in SLABS {
        if income > slab.threshold {
            tax += (income - slab.threshold) * slab.rate;
            income = slab.threshold;
        }
    }
    tax
}
