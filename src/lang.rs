//! UI language table for the assistant
//!
//! The backend auto-detects the language of each message; the controller only
//! needs the active UI language for two things: the speech locale handed to
//! local synthesis, and the fixed strings it appends itself (greeting,
//! transport-error reply). Seven languages are supported.

use serde::{Deserialize, Serialize};

/// Speech locale used when the active UI language has no explicit mapping.
pub const DEFAULT_SPEECH_LOCALE: &str = "en-IN";

/// Placeholder shown for a voice-captured user turn. The transcript lives on
/// the backend; the client never sees it.
pub const VOICE_MESSAGE_PLACEHOLDER: &str = "\u{1F399}\u{FE0F} Voice message";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Hi,
    Mr,
    Ta,
    Te,
    Bn,
    Gu,
}

impl Language {
    /// All supported UI languages
    pub const ALL: [Language; 7] = [
        Language::En,
        Language::Hi,
        Language::Mr,
        Language::Ta,
        Language::Te,
        Language::Bn,
        Language::Gu,
    ];

    /// Two-letter language code as used on the wire
    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Hi => "hi",
            Language::Mr => "mr",
            Language::Ta => "ta",
            Language::Te => "te",
            Language::Bn => "bn",
            Language::Gu => "gu",
        }
    }

    /// Parse a language code, falling back to English for anything unknown
    pub fn from_code(code: &str) -> Language {
        match code {
            "hi" => Language::Hi,
            "mr" => Language::Mr,
            "ta" => Language::Ta,
            "te" => Language::Te,
            "bn" => Language::Bn,
            "gu" => Language::Gu,
            _ => Language::En,
        }
    }

    /// BCP-47 tag handed to the speech synthesis collaborator
    pub fn speech_locale(&self) -> &'static str {
        match self {
            Language::En => "en-IN",
            Language::Hi => "hi-IN",
            Language::Mr => "mr-IN",
            Language::Ta => "ta-IN",
            Language::Te => "te-IN",
            Language::Bn => "bn-IN",
            Language::Gu => "gu-IN",
        }
    }

    /// Greeting appended as the first assistant message of every session
    pub fn greeting(&self) -> &'static str {
        match self {
            Language::En => {
                "\u{1F64F} Namaste! I am your Kumbh Mela assistant. How can I help you today?"
            }
            Language::Hi => {
                "\u{1F64F} नमस्ते! मैं आपका कुंभ मेला सहायक हूँ। मैं आपकी कैसे मदद कर सकता हूँ?"
            }
            Language::Mr => {
                "\u{1F64F} नमस्कार! मी तुमचा कुंभमेळा सहाय्यक आहे. मी कशी मदत करू?"
            }
            Language::Ta => {
                "\u{1F64F} வணக்கம்! நான் உங்கள் கும்பமேளா உதவியாளர். நான் எப்படி உதவலாம்?"
            }
            Language::Te => {
                "\u{1F64F} నమస్కారం! నేను మీ కుంభమేళా సహాయకుడిని. నేను ఎలా సహాయం చేయగలను?"
            }
            Language::Bn => {
                "\u{1F64F} নমস্কার! আমি আপনার কুম্ভমেলা সহায়ক। আমি কীভাবে সাহায্য করতে পারি?"
            }
            Language::Gu => {
                "\u{1F64F} નમસ્તે! હું તમારો કુંભ મેળા સહાયક છું. હું કેવી રીતે મદદ કરી શકું?"
            }
        }
    }

    /// Fixed reply appended when a chat or voice request fails
    pub fn transport_error(&self) -> &'static str {
        match self {
            Language::En => "Sorry, I encountered an error. Please try again.",
            Language::Hi => "क्षमा करें, एक त्रुटि हुई। कृपया पुनः प्रयास करें।",
            Language::Mr => "माफ करा, एक त्रुटी आली. कृपया पुन्हा प्रयत्न करा.",
            Language::Ta => "மன்னிக்கவும், பிழை ஏற்பட்டது. மீண்டும் முயற்சிக்கவும்.",
            Language::Te => "క్షమించండి, లోపం సంభవించింది. దయచేసి మళ్లీ ప్రయత్నించండి.",
            Language::Bn => "দুঃখিত, একটি ত্রুটি হয়েছে। আবার চেষ্টা করুন।",
            Language::Gu => "માફ કરશો, ભૂલ થઈ. ફરી પ્રયાસ કરો.",
        }
    }
}
