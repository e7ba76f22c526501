pub const BASIC_PAGE_SIZE: i64 = 6;
pub const MAX_LIMIT_PAGE_SIZE: i64 = 100;

pub const EMAIL_MAX_LENGTH: usize = 254;
pub const USERNAME_MAX_LENGTH: usize = 150;
pub const NAME_MAX_LENGTH: usize = 150;
pub const PASSWORD_MIN_LENGTH: usize = 8;

pub const TAG_NAME_MAX_LENGTH: usize = 32;
pub const RECIPE_NAME_MAX_LENGTH: usize = 256;
pub const INGREDIENT_NAME_MAX_LENGTH: usize = 128;
pub const INGREDIENT_MEASURE_MAX_LENGTH: usize = 64;

pub const COOKING_TIME_MIN: i32 = 1;
pub const COOKING_TIME_MAX: i32 = 32_000;
pub const INGREDIENT_MIN_AMOUNT: i32 = 1;
pub const INGREDIENT_MAX_AMOUNT: i32 = 32_000;

/// Characters a username may contain on top of alphanumerics.
pub const USERNAME_EXTRA_CHARS: &str = "@.+-_";

// Short-link alphabet, no 0/O and 1/I/l lookalikes.
pub const SHORT_CODE_ALPHABET: &[u8] =
    b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
pub const SHORT_CODE_LENGTH: usize = 22;

/// Bounds and page sizes, passed explicitly into the recipe composer and the
/// paginated fetches instead of living in global state.
#[derive(Clone, Debug)]
pub struct Limits {
    pub recipe_name_max: usize,
    pub cooking_time_min: i32,
    pub cooking_time_max: i32,
    pub amount_min: i32,
    pub amount_max: i32,
    pub page_size: i64,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            recipe_name_max: RECIPE_NAME_MAX_LENGTH,
            cooking_time_min: COOKING_TIME_MIN,
            cooking_time_max: COOKING_TIME_MAX,
            amount_min: INGREDIENT_MIN_AMOUNT,
            amount_max: INGREDIENT_MAX_AMOUNT,
            page_size: BASIC_PAGE_SIZE,
        }
    }
}
