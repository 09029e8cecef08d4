use crate::error::{ErrorKind, Result};
use crate::expr::{Constant, Expression, Sort, Variable};
use num_bigint::BigUint;
use num_traits::{One, ToPrimitive, Zero};
use std::fmt;

#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub enum BitVector {
    Add,
    Sub,
    Mul,
    UDiv,
    URem,
    And,
    Or,
    Xor,
    Not,
    Shl,
    LShr,
    ULt,
    ULe,
    SLt,
    SLe,
    Concat,
    Extract(usize, usize),
    ZeroExtend(usize),
    SignExtend(usize),
}

impl fmt::Display for BitVector {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Add => write!(f, "bvadd"),
            Self::Sub => write!(f, "bvsub"),
            Self::Mul => write!(f, "bvmul"),
            Self::UDiv => write!(f, "bvudiv"),
            Self::URem => write!(f, "bvurem"),
            Self::And => write!(f, "bvand"),
            Self::Or => write!(f, "bvor"),
            Self::Xor => write!(f, "bvxor"),
            Self::Not => write!(f, "bvnot"),
            Self::Shl => write!(f, "bvshl"),
            Self::LShr => write!(f, "bvlshr"),
            Self::ULt => write!(f, "bvult"),
            Self::ULe => write!(f, "bvule"),
            Self::SLt => write!(f, "bvslt"),
            Self::SLe => write!(f, "bvsle"),
            Self::Concat => write!(f, "concat"),
            Self::Extract(hi, lo) => write!(f, "(_ extract {} {})", hi, lo),
            Self::ZeroExtend(n) => write!(f, "(_ zero_extend {})", n),
            Self::SignExtend(n) => write!(f, "(_ sign_extend {})", n),
        }
    }
}

macro_rules! bv_unary {
    ( $name:ident, $op:expr ) => {
        pub fn $name(expr: Expression) -> Result<Expression> {
            expr.sort().expect_bit_vector()?;

            let result_sort = expr.sort().clone();
            Ok(Expression::new($op.into(), vec![expr], result_sort))
        }
    };
}

macro_rules! bv_arith {
    ( $name:ident, $op:expr ) => {
        pub fn $name(lhs: Expression, rhs: Expression) -> Result<Expression> {
            lhs.sort().expect_bit_vector()?;
            rhs.sort().expect_sort(lhs.sort())?;

            let result_sort = lhs.sort().clone();
            Ok(Expression::new($op.into(), vec![lhs, rhs], result_sort))
        }
    };
}

macro_rules! bv_comp {
    ( $name:ident, $op:expr ) => {
        pub fn $name(lhs: Expression, rhs: Expression) -> Result<Expression> {
            lhs.sort().expect_bit_vector()?;
            rhs.sort().expect_sort(lhs.sort())?;

            Ok(Expression::new($op.into(), vec![lhs, rhs], Sort::boolean()))
        }
    };
}

impl BitVector {
    pub fn variable(name: &str, bits: usize) -> Variable {
        Variable::new(name, Sort::bit_vector(bits))
    }

    pub fn constant(value: BitVectorValue) -> Expression {
        Expression::constant(Constant::bit_vector(value))
    }

    pub fn constant_u64(value: u64, bits: usize) -> Expression {
        Self::constant(BitVectorValue::from_u64(value, bits))
    }

    bv_unary!(not, Self::Not);

    bv_arith!(add, Self::Add);
    bv_arith!(sub, Self::Sub);
    bv_arith!(mul, Self::Mul);
    bv_arith!(udiv, Self::UDiv);
    bv_arith!(urem, Self::URem);
    bv_arith!(and, Self::And);
    bv_arith!(or, Self::Or);
    bv_arith!(xor, Self::Xor);
    bv_arith!(shl, Self::Shl);
    bv_arith!(lshr, Self::LShr);

    bv_comp!(ult, Self::ULt);
    bv_comp!(ule, Self::ULe);
    bv_comp!(slt, Self::SLt);
    bv_comp!(sle, Self::SLe);

    pub fn concat(high: Expression, low: Expression) -> Result<Expression> {
        let high_bits = high.sort().expect_bit_vector()?;
        let low_bits = low.sort().expect_bit_vector()?;

        Ok(Expression::new(
            Self::Concat.into(),
            vec![high, low],
            Sort::bit_vector(high_bits + low_bits),
        ))
    }

    pub fn extract(highest_bit: usize, lowest_bit: usize, expr: Expression) -> Result<Expression> {
        let bits = expr.sort().expect_bit_vector()?;
        if highest_bit < lowest_bit || highest_bit >= bits {
            return Err(ErrorKind::Sort(
                format!("extract {}..{} within w{}", highest_bit, lowest_bit, bits),
                expr.sort().to_string(),
            )
            .into());
        }

        Ok(Expression::new(
            Self::Extract(highest_bit, lowest_bit).into(),
            vec![expr],
            Sort::bit_vector(highest_bit - lowest_bit + 1),
        ))
    }

    pub fn zero_extend(bits: usize, expr: Expression) -> Result<Expression> {
        let width = expr.sort().expect_bit_vector()?;
        if bits < width {
            return Err(ErrorKind::Sort(format!("at most w{}", bits), expr.sort().to_string()).into());
        }

        Ok(Expression::new(
            Self::ZeroExtend(bits - width).into(),
            vec![expr],
            Sort::bit_vector(bits),
        ))
    }

    pub fn sign_extend(bits: usize, expr: Expression) -> Result<Expression> {
        let width = expr.sort().expect_bit_vector()?;
        if bits < width {
            return Err(ErrorKind::Sort(format!("at most w{}", bits), expr.sort().to_string()).into());
        }

        Ok(Expression::new(
            Self::SignExtend(bits - width).into(),
            vec![expr],
            Sort::bit_vector(bits),
        ))
    }
}

/// A fixed-width bit-vector value, always kept reduced modulo `2^bits`.
#[derive(Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct BitVectorValue {
    value: BigUint,
    bits: usize,
}

fn mask(bits: usize) -> BigUint {
    (BigUint::one() << bits) - BigUint::one()
}

impl BitVectorValue {
    pub fn new(value: BigUint, bits: usize) -> Self {
        Self {
            value: value & mask(bits),
            bits,
        }
    }

    pub fn from_u64(value: u64, bits: usize) -> Self {
        Self::new(BigUint::from(value), bits)
    }

    pub fn zero(bits: usize) -> Self {
        Self::new(BigUint::zero(), bits)
    }

    pub fn ones(bits: usize) -> Self {
        Self::new(mask(bits), bits)
    }

    pub fn value(&self) -> &BigUint {
        &self.value
    }

    pub fn bits(&self) -> usize {
        self.bits
    }

    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    pub fn to_u64(&self) -> Option<u64> {
        self.value.to_u64()
    }

    /// Returns whether the sign bit is set.
    pub fn msb(&self) -> bool {
        self.bits > 0 && !(&self.value >> (self.bits - 1)).is_zero()
    }

    pub fn add(&self, other: &Self) -> Self {
        Self::new(&self.value + &other.value, self.bits)
    }

    pub fn sub(&self, other: &Self) -> Self {
        Self::new((&self.value + (BigUint::one() << self.bits)) - &other.value, self.bits)
    }

    pub fn mul(&self, other: &Self) -> Self {
        Self::new(&self.value * &other.value, self.bits)
    }

    pub fn udiv(&self, other: &Self) -> Self {
        if other.is_zero() {
            Self::ones(self.bits)
        } else {
            Self::new(&self.value / &other.value, self.bits)
        }
    }

    pub fn urem(&self, other: &Self) -> Self {
        if other.is_zero() {
            self.clone()
        } else {
            Self::new(&self.value % &other.value, self.bits)
        }
    }

    pub fn and(&self, other: &Self) -> Self {
        Self::new(&self.value & &other.value, self.bits)
    }

    pub fn or(&self, other: &Self) -> Self {
        Self::new(&self.value | &other.value, self.bits)
    }

    pub fn xor(&self, other: &Self) -> Self {
        Self::new(&self.value ^ &other.value, self.bits)
    }

    pub fn not(&self) -> Self {
        Self::new(&self.value ^ mask(self.bits), self.bits)
    }

    fn shift_amount(&self, other: &Self) -> Option<usize> {
        other.value.to_usize().filter(|&shift| shift < self.bits)
    }

    pub fn shl(&self, other: &Self) -> Self {
        match self.shift_amount(other) {
            Some(shift) => Self::new(&self.value << shift, self.bits),
            None => Self::zero(self.bits),
        }
    }

    pub fn lshr(&self, other: &Self) -> Self {
        match self.shift_amount(other) {
            Some(shift) => Self::new(&self.value >> shift, self.bits),
            None => Self::zero(self.bits),
        }
    }

    pub fn ult(&self, other: &Self) -> bool {
        self.value < other.value
    }

    pub fn ule(&self, other: &Self) -> bool {
        self.value <= other.value
    }

    pub fn slt(&self, other: &Self) -> bool {
        match (self.msb(), other.msb()) {
            (true, false) => true,
            (false, true) => false,
            _ => self.value < other.value,
        }
    }

    pub fn sle(&self, other: &Self) -> bool {
        self == other || self.slt(other)
    }

    /// `self` forms the high bits of the result.
    pub fn concat(&self, low: &Self) -> Self {
        Self::new((&self.value << low.bits) | &low.value, self.bits + low.bits)
    }

    pub fn extract(&self, highest_bit: usize, lowest_bit: usize) -> Self {
        Self::new(&self.value >> lowest_bit, highest_bit - lowest_bit + 1)
    }

    pub fn zero_extend(&self, additional_bits: usize) -> Self {
        Self::new(self.value.clone(), self.bits + additional_bits)
    }

    pub fn sign_extend(&self, additional_bits: usize) -> Self {
        let bits = self.bits + additional_bits;
        if self.msb() {
            Self::new(&self.value | (mask(bits) ^ mask(self.bits)), bits)
        } else {
            Self::new(self.value.clone(), bits)
        }
    }
}

impl fmt::Display for BitVectorValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "(w{} {})", self.bits, self.value)
    }
}
